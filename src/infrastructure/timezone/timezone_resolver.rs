use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// True iff the host's tz database accepts the name.
pub fn is_valid_time_zone(name: &str) -> bool {
    Tz::from_str(name.trim()).is_ok()
}

/// Resolves the effective zone: the trimmed preference when valid, else the
/// runtime's detected zone, else UTC. Never fails, so every "what day is it"
/// computation has an answer.
pub fn resolve_effective_time_zone(preference: Option<&str>) -> Tz {
    if let Some(pref) = preference {
        if let Ok(tz) = Tz::from_str(pref.trim()) {
            return tz;
        }
    }
    if let Ok(local) = iana_time_zone::get_timezone() {
        if let Ok(tz) = Tz::from_str(&local) {
            return tz;
        }
    }
    Tz::UTC
}

/// The wall-clock calendar date for an instant in a zone. This is the single
/// source of "what day is it"; all recurrence and rollover math runs on the
/// resulting calendar days, never on raw instants.
pub fn calendar_day_of(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Today's calendar date in a zone.
pub fn today_in(tz: Tz) -> NaiveDate {
    calendar_day_of(Utc::now(), tz)
}
