//! Read-side aggregation over fetched records
//!
//! Pure functions with no storage access:
//! - Grouping by calendar day for list views
//! - Monthly spending totals and budget progress
//! - Case-insensitive text search over diaries
//!
//! Calendar computations take an explicit time zone (`*_in` variants); the
//! plain versions use the local zone.

pub mod grouping;
pub mod search;
pub mod totals;

pub use grouping::{day_key, group_by_day, group_by_day_in, DayGroups};
pub use search::filter_text;
pub use totals::{budget_progress, monthly_total, monthly_total_in, Month};
