use std::fmt;

use serde::{Deserialize, Serialize};

use crate::budget::MemoryBudget;

/// How full the registry cache is relative to its budget. Reported, never acted upon:
/// eviction is driven by the budget itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryPressure::Low => "low",
            MemoryPressure::Medium => "medium",
            MemoryPressure::High => "high",
            MemoryPressure::Critical => "critical",
        }
    }
}

impl fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage ratios (`usage / budget`) at which each level starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryPressureThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for MemoryPressureThresholds {
    fn default() -> Self {
        Self {
            medium: 0.70,
            high: 0.85,
            critical: 0.95,
        }
    }
}

impl MemoryPressureThresholds {
    pub fn level_for_ratio(self, ratio: f64) -> MemoryPressure {
        [
            (self.critical, MemoryPressure::Critical),
            (self.high, MemoryPressure::High),
            (self.medium, MemoryPressure::Medium),
        ]
        .into_iter()
        .find(|&(threshold, _)| ratio >= threshold)
        .map_or(MemoryPressure::Low, |(_, level)| level)
    }

    pub fn level_for_usage(self, budget: MemoryBudget, usage: u64) -> MemoryPressure {
        self.level_for_ratio(budget.usage_ratio(usage))
    }
}
