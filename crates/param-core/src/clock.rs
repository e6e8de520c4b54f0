//! Fuente de timestamps del registro.

use chrono::{DateTime, Utc};

use crate::constants::TIMESTAMP_FORMAT;

/// Instante actual (UTC).
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Representación usada en snapshots.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
