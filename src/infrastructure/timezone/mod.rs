pub mod timezone_resolver;

pub use timezone_resolver::{
    calendar_day_of, is_valid_time_zone, resolve_effective_time_zone, today_in,
};
