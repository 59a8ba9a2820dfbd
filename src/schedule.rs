use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::Event;

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M%:z",
];

const LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a feed timestamp. Values carrying an offset are converted into `tz`;
/// values without one are read as wall-clock time in `tz`.
pub fn parse_timestamp(text: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&tz));
    }

    let with_offset = match text.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => text.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt.with_timezone(&tz));
        }
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return to_local(naive, tz);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| to_local(naive, tz))
}

/// Wall-clock time inside a DST gap is pushed forward past the gap.
fn to_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

/// Local midnight of the current day in `tz`.
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    let local_now = now.with_timezone(&tz);
    local_now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| to_local(midnight, tz))
        .unwrap_or(local_now)
}

pub fn reference_year(now: DateTime<Utc>, tz: Tz) -> i32 {
    now.with_timezone(&tz).year()
}

/// Stable: events sharing a start keep their incoming order.
pub fn sort_ascending_by_start<'a, I>(events: I) -> Vec<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut ordered: Vec<&Event> = events.into_iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start));
    ordered
}

pub fn format_range(start: &DateTime<Tz>, end: Option<&DateTime<Tz>>, reference_year: i32) -> String {
    let start_text = date_time_label(start, reference_year);

    let end = match end {
        Some(end) if end != start => end,
        _ => return start_text,
    };

    if end.date_naive() == start.date_naive() {
        format!("{start_text}–{}", end.format("%H:%M"))
    } else {
        format!("{start_text} → {}", date_time_label(end, reference_year))
    }
}

fn date_time_label(dt: &DateTime<Tz>, reference_year: i32) -> String {
    let date = if dt.year() == reference_year {
        dt.format("%a, %-d %b")
    } else {
        dt.format("%a, %-d %b %Y")
    };
    format!("{date} · {}", dt.format("%H:%M"))
}
