//! Shared timestamp helpers for entity bookkeeping.

use chrono::{NaiveDateTime, SubsecRound};

use crate::core::error::KardexError;

/// Render format: ISO-8601 with microseconds, e.g. `2024-01-01T00:00:00.000000`.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
/// Parse format: the fractional part is optional so documents written by
/// other tooling (which may omit `.000000`) still load.
const ISO_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Current wall-clock time, naive UTC, truncated to the microsecond
/// precision the persisted format can represent.
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc().trunc_subsecs(6)
}

pub fn to_iso(ts: NaiveDateTime) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parses an ISO-8601 timestamp; `field` names the attribute for the
/// diagnostic on malformed input.
pub fn from_iso(field: &str, value: &str) -> Result<NaiveDateTime, KardexError> {
    NaiveDateTime::parse_from_str(value, ISO_PARSE_FORMAT).map_err(|source| {
        KardexError::Timestamp {
            field: field.to_string(),
            value: value.to_string(),
            source,
        }
    })
}
