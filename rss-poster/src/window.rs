use crate::item::Item;
use crate::types::{PosterError, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fmt;
use tracing::{debug, warn};

/// The publication-time interval accepted by one run: `(start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RunWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(PosterError::Configuration(format!(
                "run window start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Window ending at the start of the hour containing `now`, in `now`'s time zone.
    pub fn ending_at<Tz: TimeZone>(now: DateTime<Tz>, look_back_hours: i64) -> Result<Self> {
        let end = truncate_to_hour(now)?.with_timezone(&Utc);
        let start = Duration::try_hours(look_back_hours)
            .and_then(|back| end.checked_sub_signed(back))
            .ok_or_else(|| {
                PosterError::Configuration(format!(
                    "look-back period of {} hours is out of range",
                    look_back_hours
                ))
            })?;
        Self::new(start, end)
    }

    /// Derives the window from an optional override, falling back to the local clock.
    ///
    /// An override with an explicit offset (`...Z`, `+05:30`) is truncated to the hour
    /// in that offset, not in the host's zone, so a pinned run gives the same window on
    /// every machine. Naive overrides are read as local time.
    pub fn derive(now_override: Option<&str>, look_back_hours: i64) -> Result<Self> {
        match now_override {
            Some(raw) => match parse_override(raw)? {
                Override::Fixed(now) => Self::ending_at(now, look_back_hours),
                Override::Local(now) => Self::ending_at(now, look_back_hours),
            },
            None => Self::ending_at(Local::now(), look_back_hours),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Exclusive at `start`, inclusive at `end`. Logs why an item was left out.
    pub fn accepts(&self, item: &Item) -> bool {
        match item.pub_date {
            None => {
                warn!("Undefined PubDate: '{}'", item.title);
                false
            }
            Some(published) if published <= self.start => {
                debug!("[{}] Too old PubDate: {}", published.to_rfc3339(), item.title);
                false
            }
            Some(published) if published > self.end => {
                debug!("[{}] Too new PubDate: {}", published.to_rfc3339(), item.title);
                false
            }
            Some(_) => true,
        }
    }
}

impl fmt::Display for RunWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

enum Override {
    Fixed(DateTime<chrono::FixedOffset>),
    Local(DateTime<Local>),
}

fn parse_override(raw: &str) -> Result<Override> {
    let raw = raw.trim();
    if let Ok(fixed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Override::Fixed(fixed));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(Override::Local)
        .ok_or_else(|| PosterError::Configuration(format!("invalid current time '{}'", raw)))
}

/// Zeroes minutes, seconds and sub-seconds in the value's own calendar.
pub fn truncate_to_hour<Tz: TimeZone>(instant: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let tz = instant.timezone();
    let naive = instant.naive_local();
    let floored = naive
        .with_minute(0)
        .and_then(|n| n.with_second(0))
        .and_then(|n| n.with_nanosecond(0))
        .ok_or_else(|| PosterError::Configuration(format!("cannot truncate {}", naive)))?;

    tz.from_local_datetime(&floored)
        .earliest()
        .ok_or_else(|| {
            PosterError::Configuration(format!("{} does not exist in the local time zone", floored))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawEntry;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn item_at(pub_date: Option<DateTime<Utc>>) -> Item {
        let mut item = Item::from_raw(&RawEntry {
            guid: Some("g".to_string()),
            title: Some("t".to_string()),
            link: Some("https://example.com".to_string()),
            ..Default::default()
        })
        .unwrap();
        item.pub_date = pub_date;
        item
    }

    #[test]
    fn window_ends_on_the_hour() {
        let window = RunWindow::derive(Some("2024-01-01T10:30:00Z"), 1).unwrap();
        assert_eq!(window.end(), utc("2024-01-01T10:00:00Z"));
        assert_eq!(window.start(), utc("2024-01-01T09:00:00Z"));
    }

    #[test]
    fn truncation_respects_the_offset_calendar() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T10:45:12.345+05:30").unwrap();
        let window = RunWindow::ending_at(now, 3).unwrap();
        assert_eq!(window.end(), utc("2024-06-01T04:30:00Z"));
        assert_eq!(window.start(), utc("2024-06-01T01:30:00Z"));
    }

    #[test]
    fn derivation_is_repeatable() {
        let a = RunWindow::derive(Some("2024-03-10T23:59:59Z"), 6).unwrap();
        let b = RunWindow::derive(Some("2024-03-10T23:59:59Z"), 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_positive_look_back_is_fatal() {
        let zero = RunWindow::derive(Some("2024-01-01T10:30:00Z"), 0);
        assert!(matches!(zero, Err(PosterError::Configuration(_))));

        let negative = RunWindow::derive(Some("2024-01-01T10:30:00Z"), -2);
        assert!(matches!(negative, Err(PosterError::Configuration(_))));
    }

    #[test]
    fn garbage_override_is_fatal() {
        let result = RunWindow::derive(Some("half past ten"), 1);
        assert!(matches!(result, Err(PosterError::Configuration(_))));
    }

    #[test]
    fn naive_override_is_accepted() {
        let window = RunWindow::derive(Some("2024-01-01T10:30"), 1).unwrap();
        assert_eq!(window.end() - window.start(), Duration::hours(1));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let t = utc("2024-01-01T10:00:00Z");
        assert!(RunWindow::new(t, t).is_err());
        assert!(RunWindow::new(t + Duration::seconds(1), t).is_err());
    }

    #[test]
    fn boundaries_are_exclusive_low_inclusive_high() {
        let window = RunWindow::derive(Some("2024-01-01T10:30:00Z"), 1).unwrap();
        let ms = Duration::milliseconds(1);

        assert!(!window.accepts(&item_at(Some(window.start()))));
        assert!(window.accepts(&item_at(Some(window.start() + ms))));
        assert!(window.accepts(&item_at(Some(window.end()))));
        assert!(!window.accepts(&item_at(Some(window.end() + ms))));
    }

    #[test]
    fn undated_items_are_rejected() {
        let window = RunWindow::derive(Some("2024-01-01T10:30:00Z"), 1).unwrap();
        assert!(!window.accepts(&item_at(None)));
    }
}
