use chrono::NaiveDate;

/// Strict `YYYY-MM-DD` parsing. Anything that is not a real calendar date
/// (bad shape, month 13, Feb 30) yields `None` so read paths can degrade
/// instead of failing.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Formats a date in the canonical `YYYY-MM-DD` form used by storage and
/// the template engine.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
