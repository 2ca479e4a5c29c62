//! Database helper functions for safe type conversions.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Convert an epoch-millisecond value from the state layout into a timestamp.
pub fn datetime_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).with_context(|| format!("Invalid epoch millis: {ms}"))
}
