//! UTC timestamp source.

use chrono::{DateTime, Utc};

/// Current instant in UTC, sub-second precision.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
