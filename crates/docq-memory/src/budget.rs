use serde::{Deserialize, Serialize};
use std::fmt;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
pub const GB: u64 = 1024 * MB;

/// Upper bound on the estimated bytes held by a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBudget {
    pub total: u64,
}

impl MemoryBudget {
    pub const DEFAULT_MB: u64 = 100;

    pub const fn from_bytes(total: u64) -> Self {
        Self { total }
    }

    pub const fn from_mb(mb: u64) -> Self {
        Self {
            total: mb.saturating_mul(MB),
        }
    }

    /// `usage / budget`, with a zero budget treated as one byte so the ratio stays finite.
    pub fn usage_ratio(self, usage: u64) -> f64 {
        (usage as f64) / (self.total.max(1) as f64)
    }

    pub fn is_exceeded_by(self, usage: u64) -> bool {
        usage > self.total
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::from_mb(Self::DEFAULT_MB)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSizeParseError {
    input: String,
}

impl fmt::Display for ByteSizeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid byte size `{}` (expected e.g. `4096`, `512KB`, `64MiB`, `1G`)",
            self.input
        )
    }
}

impl std::error::Error for ByteSizeParseError {}

/// Parse a byte size such as `4096`, `512k`, `64MiB` or `1.5GB`.
///
/// Suffixes are case-insensitive and always binary (`KB` == `KiB` == 1024).
pub fn parse_byte_size(input: &str) -> Result<u64, ByteSizeParseError> {
    let err = || ByteSizeParseError {
        input: input.to_owned(),
    };

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    if number.is_empty() {
        return Err(err());
    }

    let multiplier = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => KB,
        "m" | "mb" | "mib" => MB,
        "g" | "gb" | "gib" => GB,
        _ => return Err(err()),
    };

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier).ok_or_else(err);
    }

    let fractional = number.parse::<f64>().map_err(|_| err())?;
    let bytes = fractional * multiplier as f64;
    if !bytes.is_finite() || bytes < 0.0 || bytes > u64::MAX as f64 {
        return Err(err());
    }
    Ok(bytes.round() as u64)
}
