use std::path::Path;

use chrono_tz::Tz;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::FeedSource;
use crate::errors::FeedError;
use crate::models::{Event, RawEvent};

pub async fn fetch_json(client: &Client, source: &FeedSource) -> Result<Value, FeedError> {
    let text = match source {
        FeedSource::Remote(url) => fetch_text(client, url).await?,
        FeedSource::Local(path) => read_text(path).await?,
    };
    serde_json::from_str(&text).map_err(|err| FeedError::Parse {
        source_name: source.to_string(),
        message: err.to_string(),
    })
}

async fn fetch_text(client: &Client, url: &Url) -> Result<String, FeedError> {
    debug!(%url, "fetching feed");
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|err| FeedError::Request {
            url: url.to_string(),
            message: err.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|err| FeedError::Request {
        url: url.to_string(),
        message: format!("unable to read response body: {err}"),
    })
}

async fn read_text(path: &Path) -> Result<String, FeedError> {
    debug!(path = %path.display(), "reading feed");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| FeedError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
}

/// Accepts `[...]` or `{ "events": [...] }`; any other shape holds no events.
pub fn normalize_events(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Records that are not objects or lack a usable start are skipped.
pub fn parse_events(items: Vec<Value>, tz: Tz) -> Vec<Event> {
    let mut events = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!(index, "skipping event record that is not an object");
            continue;
        }
        let raw: RawEvent = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable event record");
                continue;
            }
        };
        let title = raw.title.clone().unwrap_or_default();
        match Event::from_raw(raw, tz) {
            Some(event) => events.push(event),
            None => warn!(index, %title, "skipping event without a valid dateTime"),
        }
    }
    events
}
