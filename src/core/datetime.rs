#![forbid(unsafe_code)]

//! Turns the free-form date text users type into comparable timestamps.
//!
//! All timestamps are wall-clock times in the offset the normalizer was built
//! with. Relative expressions ("tomorrow", "in 2h", "friday") resolve against
//! the `now` passed in by the caller, so results are reproducible in tests.

use std::sync::OnceLock;

use regex::Regex;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, Weekday};

use crate::error::LisaError;

pub type Timestamp = PrimitiveDateTime;

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_MINUTES: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const ISO_SECONDS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const ISO_FRACTION: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

/// Hour used for "tonight".
const EVENING_HOUR: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    offset: UtcOffset,
}

impl DateNormalizer {
    #[must_use]
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Uses the machine's current UTC offset, or UTC when it cannot be
    /// determined (for example in a multi-threaded process on Unix).
    #[must_use]
    pub fn local() -> Self {
        Self::new(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
    }

    /// The current instant, truncated to whole seconds.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        let now = OffsetDateTime::now_utc().to_offset(self.offset);
        let time = now.time().replace_nanosecond(0).unwrap_or(now.time());
        PrimitiveDateTime::new(now.date(), time)
    }

    /// Accepts ISO forms plus the common natural-language expressions.
    pub fn parse(&self, text: &str, now: Timestamp) -> Result<Timestamp, LisaError> {
        if let Ok(ts) = self.parse_iso(text) {
            return Ok(ts);
        }
        let normalized = collapse_whitespace(&text.to_lowercase());
        parse_loose(&normalized, now).ok_or_else(|| LisaError::DateParse {
            input: text.to_owned(),
        })
    }

    /// Strict form for timestamps the tool wrote itself: ISO date, ISO
    /// datetime (with `T` or a space, optional seconds and fraction) or
    /// RFC 3339 with an offset.
    pub fn parse_iso(&self, text: &str) -> Result<Timestamp, LisaError> {
        let s = text.trim();
        let err = || LisaError::DateParse {
            input: text.to_owned(),
        };

        if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
            if !(-9998..=9998).contains(&odt.year()) {
                return Err(err());
            }
            let local = odt.to_offset(self.offset);
            return Ok(PrimitiveDateTime::new(local.date(), local.time()));
        }

        if s.len() == 10 {
            return Date::parse(s, ISO_DATE)
                .map(Date::midnight)
                .map_err(|_| err());
        }

        let s = match s.as_bytes().get(10) {
            Some(b' ') => format!("{}T{}", &s[..10], s[11..].trim_start()),
            _ => s.to_owned(),
        };
        for fmt in [ISO_SECONDS, ISO_MINUTES, ISO_FRACTION] {
            if let Ok(ts) = PrimitiveDateTime::parse(&s, fmt) {
                return Ok(ts);
            }
        }
        Err(err())
    }
}

#[must_use]
pub fn format_iso(ts: Timestamp) -> String {
    ts.format(ISO_SECONDS)
        .unwrap_or_else(|_| ts.to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_loose(s: &str, now: Timestamp) -> Option<Timestamp> {
    if s.is_empty() {
        return None;
    }
    if s == "now" {
        return Some(now);
    }
    if s == "tonight" {
        return Some(now.date().with_time(Time::from_hms(EVENING_HOUR, 0, 0).ok()?));
    }
    if let Some(ts) = parse_relative(s, now) {
        return Some(ts);
    }
    if let Some(t) = parse_clock(s) {
        return Some(now.date().with_time(t));
    }
    if let Some(d) = parse_day(s, now.date()) {
        return Some(d.midnight());
    }

    // "<day> <time>" and "<day> at <time>"
    let (day, clock) = s.rsplit_once(' ')?;
    let day = day.strip_suffix(" at").unwrap_or(day);
    let t = parse_clock(clock)?;
    let d = parse_day(day, now.date()).or_else(|| Date::parse(day, ISO_DATE).ok())?;
    Some(d.with_time(t))
}

/// "in 3 days", "2h", "3 weeks ago".
fn parse_relative(s: &str, now: Timestamp) -> Option<Timestamp> {
    const RE: &str = r"^(in\s+)?(\d{1,6})\s*(m|mins?|minutes?|h|hrs?|hours?|d|days?|w|wks?|weeks?)(\s+ago)?$";
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(RE).ok()).as_ref()?;

    let caps = re.captures(s)?;
    let ago = caps.get(4).is_some();
    if caps.get(1).is_some() && ago {
        return None;
    }
    let n: i64 = caps[2].parse().ok()?;
    let n = if ago { -n } else { n };
    let delta = match caps[3].chars().next()? {
        'm' => Duration::minutes(n),
        'h' => Duration::hours(n),
        'd' => Duration::days(n),
        _ => Duration::weeks(n),
    };
    now.checked_add(delta)
}

/// "14:30", "9am", "9:15pm". A bare number is not a time.
fn parse_clock(s: &str) -> Option<Time> {
    const RE: &str = r"^(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$";
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(RE).ok()).as_ref()?;

    let caps = re.captures(s)?;
    let minute = caps.get(2);
    let meridiem = caps.get(3).map(|m| m.as_str());
    if minute.is_none() && meridiem.is_none() {
        return None;
    }
    let mut hour: u8 = caps[1].parse().ok()?;
    let minute: u8 = minute.map_or(Some(0), |m| m.as_str().parse().ok())?;
    match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour %= 12;
            if m == "pm" {
                hour += 12;
            }
        }
        None if hour > 23 => return None,
        None => {}
    }
    Time::from_hms(hour, minute, 0).ok()
}

fn parse_day(s: &str, today: Date) -> Option<Date> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return today.next_day(),
        "yesterday" => return today.previous_day(),
        _ => {}
    }
    let weekday_name = s.strip_prefix("next ").unwrap_or(s);
    if let Some(weekday) = parse_weekday(weekday_name) {
        let ahead = (i64::from(weekday.number_days_from_monday())
            - i64::from(today.weekday().number_days_from_monday()))
        .rem_euclid(7);
        let ahead = if ahead == 0 { 7 } else { ahead };
        return today.checked_add(Duration::days(ahead));
    }
    parse_numeric_date(s).or_else(|| parse_named_date(s))
}

/// "2024/06/01" and US-style "06/01/2024".
fn parse_numeric_date(s: &str) -> Option<Date> {
    const RE: &str = r"^(?:(\d{4})/(\d{1,2})/(\d{1,2})|(\d{1,2})/(\d{1,2})/(\d{4}))$";
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(RE).ok()).as_ref()?;

    let caps = re.captures(s)?;
    let (y, m, d) = if caps.get(1).is_some() {
        (&caps[1], &caps[2], &caps[3])
    } else {
        (&caps[6], &caps[4], &caps[5])
    };
    calendar_date(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// "june 1 2024", "jun 1st, 2024", "1 june 2024".
fn parse_named_date(s: &str) -> Option<Date> {
    const RE: &str = r"^(?:([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?|(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)\.?),?\s+(\d{4})$";
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(RE).ok()).as_ref()?;

    let caps = re.captures(s)?;
    let (name, day) = if caps.get(1).is_some() {
        (&caps[1], &caps[2])
    } else {
        (&caps[4], &caps[3])
    };
    let month = parse_month(name)?;
    let year: i32 = caps[5].parse().ok()?;
    Date::from_calendar_date(year, month, day.parse().ok()?).ok()
}

fn calendar_date(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_month(name: &str) -> Option<Month> {
    const MONTHS: [(&str, Month); 12] = [
        ("january", Month::January),
        ("february", Month::February),
        ("march", Month::March),
        ("april", Month::April),
        ("may", Month::May),
        ("june", Month::June),
        ("july", Month::July),
        ("august", Month::August),
        ("september", Month::September),
        ("october", Month::October),
        ("november", Month::November),
        ("december", Month::December),
    ];
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(full, _)| full.starts_with(name))
        .map(|(_, m)| *m)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    const DAYS: [(&str, Weekday); 7] = [
        ("monday", Weekday::Monday),
        ("tuesday", Weekday::Tuesday),
        ("wednesday", Weekday::Wednesday),
        ("thursday", Weekday::Thursday),
        ("friday", Weekday::Friday),
        ("saturday", Weekday::Saturday),
        ("sunday", Weekday::Sunday),
    ];
    if name.len() < 3 {
        return None;
    }
    DAYS.iter()
        .find(|(full, _)| full.starts_with(name))
        .map(|(_, d)| *d)
}
