//! Timestamp and duration display utilities.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// A `Timestamp` rendered in the system time zone as
/// `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

/// Time spent between a result's start and end dates, as `1m 05s`,
/// `12.3s` or `-` when the result is still open.
pub struct Elapsed {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

impl Elapsed {
    pub fn new(start: Timestamp, end: Option<Timestamp>) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(end) = self.end else {
            return write!(f, "-");
        };
        let millis = end.as_millisecond() - self.start.as_millisecond();
        if millis < 0 {
            return write!(f, "-");
        }
        let seconds = millis / 1000;
        if seconds >= 60 {
            write!(f, "{}m {:02}s", seconds / 60, seconds % 60)
        } else {
            write!(f, "{}.{}s", seconds, (millis % 1000) / 100)
        }
    }
}
