//! Memory budgeting and footprint estimation for docq's registry cache.
//!
//! Accounting here is approximate:
//! - Budgets are plain byte counts, configured once at startup.
//! - Footprints are estimated from the values themselves via [`MemoryFootprint`];
//!   when a value cannot describe its own size, [`MemoryEstimator`] falls back
//!   to a per-object heuristic.
//! - Pressure levels are derived from `usage / budget` and are only used for
//!   reporting.

mod budget;
mod estimate;
mod pressure;

pub use budget::{parse_byte_size, ByteSizeParseError, MemoryBudget, GB, KB, MB};
pub use estimate::{MemoryEstimator, MemoryFootprint, FALLBACK_BYTES_PER_OBJECT};
pub use pressure::{MemoryPressure, MemoryPressureThresholds};
