use chrono::{Datelike, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a valid YYYY-MM-DD date")]
pub struct DateError(pub String);

/// Parse a calendar date in ISO `YYYY-MM-DD` form, ignoring surrounding whitespace.
///
/// Years are limited to `0000..=9999`: dates are stored as ISO text and
/// compared lexically, which only matches calendar order for four-digit years.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .filter(|date| (0..=9999).contains(&date.year()))
        .ok_or_else(|| DateError(trimmed.to_string()))
}
