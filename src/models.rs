use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::metadata::Category;
use crate::schedule;
use crate::utils::non_empty;

/// One record as it appears in the events feed.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub date_time: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date_time: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub event_type: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub style: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub venue: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A loaded event with its timestamps resolved in the board timezone.
#[derive(Clone, Debug)]
pub struct Event {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
    pub event_type: Option<String>,
    pub city: Option<String>,
    pub style: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub extra: Map<String, Value>,
}

impl Event {
    /// Returns `None` when the start timestamp is missing or unparseable.
    pub fn from_raw(raw: RawEvent, tz: Tz) -> Option<Self> {
        let start = raw
            .date_time
            .as_deref()
            .and_then(|text| schedule::parse_timestamp(text, tz))?;
        let end = raw
            .end_date_time
            .as_deref()
            .and_then(|text| schedule::parse_timestamp(text, tz));

        Some(Self {
            title: raw.title.unwrap_or_default(),
            start,
            end,
            event_type: raw.event_type,
            city: raw.city,
            style: raw.style,
            venue: raw.venue,
            location: raw.location,
            image_url: raw.image_url,
            link: raw.link,
            extra: raw.extra,
        })
    }

    pub fn title(&self) -> &str {
        non_empty(Some(&self.title)).unwrap_or("Untitled Event")
    }

    pub fn field(&self, category: Category) -> Option<&str> {
        let value = match category {
            Category::City => &self.city,
            Category::Style => &self.style,
            Category::Type => &self.event_type,
            Category::Venue => &self.venue,
        };
        non_empty(value.as_deref())
    }
}

/// Accepts strings and numbers; anything else reads as absent.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_camel_case_fields_and_keeps_extra() {
        let raw: RawEvent = serde_json::from_value(json!({
            "title": "Friday Social",
            "dateTime": "2024-05-03T20:00",
            "endDateTime": "2024-05-03T23:30",
            "type": "social",
            "city": "wgtn",
            "imageUrl": "https://example.com/a.jpg",
            "organiser": "Salsa Club"
        }))
        .expect("raw event");

        assert_eq!(raw.date_time.as_deref(), Some("2024-05-03T20:00"));
        assert_eq!(raw.event_type.as_deref(), Some("social"));
        assert_eq!(raw.image_url.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(raw.extra.get("organiser"), Some(&json!("Salsa Club")));
    }

    #[test]
    fn tolerates_numeric_and_null_fields() {
        let raw: RawEvent = serde_json::from_value(json!({
            "title": null,
            "dateTime": "2024-05-03T20:00",
            "city": 42,
            "style": ["not", "a", "string"]
        }))
        .expect("raw event");

        assert_eq!(raw.title, None);
        assert_eq!(raw.city.as_deref(), Some("42"));
        assert_eq!(raw.style, None);
    }

    #[test]
    fn drops_records_without_a_valid_start() {
        let tz = chrono_tz::Pacific::Auckland;
        let missing = RawEvent::default();
        let garbage = RawEvent {
            date_time: Some("next tuesday".into()),
            ..RawEvent::default()
        };
        assert!(Event::from_raw(missing, tz).is_none());
        assert!(Event::from_raw(garbage, tz).is_none());
    }

    #[test]
    fn bad_end_degrades_to_no_end() {
        let raw = RawEvent {
            title: Some("Class".into()),
            date_time: Some("2024-05-01T18:00".into()),
            end_date_time: Some("later".into()),
            ..RawEvent::default()
        };
        let event = Event::from_raw(raw, chrono_tz::UTC).expect("event");
        assert!(event.end.is_none());
        assert_eq!(event.title(), "Class");
    }

    #[test]
    fn blank_title_falls_back() {
        let raw = RawEvent {
            title: Some("  ".into()),
            date_time: Some("2024-05-01".into()),
            ..RawEvent::default()
        };
        let event = Event::from_raw(raw, chrono_tz::UTC).expect("event");
        assert_eq!(event.title(), "Untitled Event");
    }
}
