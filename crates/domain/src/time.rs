//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// UTC timestamp used for reading and event times.
pub type Timestamp = DateTime<Utc>;

/// Layout of `SQLite`'s `CURRENT_TIMESTAMP`, extended with fractional seconds.
pub const SQL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Drop precision below one microsecond, the finest [`to_sql`] keeps.
#[must_use]
pub fn truncate(ts: Timestamp) -> Timestamp {
    ts.trunc_subsecs(6)
}

/// Render a timestamp the way `SQLite` renders `CURRENT_TIMESTAMP`, keeping
/// sub-second precision.
#[must_use]
pub fn to_sql(ts: Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse a timestamp written by [`to_sql`] or by `CURRENT_TIMESTAMP`.
///
/// # Errors
///
/// Returns a [`chrono::ParseError`] when `value` does not match [`SQL_FORMAT`].
pub fn from_sql(value: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, SQL_FORMAT).map(|naive| naive.and_utc())
}
