pub mod base;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use reqwest::{Client, Url};
use tracing::info;

use crate::errors::FeedError;
use crate::metadata::Catalog;
use crate::models::Event;

const USER_AGENT: &str = "EventBoard/0.1";

/// Where a JSON document comes from: an http(s) URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Remote(Url),
    Local(PathBuf),
}

impl FromStr for FeedSource {
    type Err = FeedError;

    fn from_str(location: &str) -> Result<Self, Self::Err> {
        let location = location.trim();
        let lowered = location.to_ascii_lowercase();

        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            let url = Url::parse(location).map_err(|err| FeedError::Request {
                url: location.to_string(),
                message: err.to_string(),
            })?;
            return Ok(FeedSource::Remote(url));
        }

        if lowered.starts_with("file://") {
            let path = Url::parse(location)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| FeedError::Io {
                    path: location.to_string(),
                    message: "not a usable file URL".to_string(),
                })?;
            return Ok(FeedSource::Local(path));
        }

        Ok(FeedSource::Local(PathBuf::from(location)))
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Remote(url) => write!(f, "{url}"),
            FeedSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything the board needs from the initial load.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub events: Vec<Event>,
    pub catalog: Option<Catalog>,
}

pub struct FeedLoader {
    client: Client,
    tz: Tz,
}

impl FeedLoader {
    pub fn new(tz: Tz, timeout: Option<Duration>) -> Result<Self, FeedError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| FeedError::Client(err.to_string()))?;
        Ok(Self::with_client(client, tz))
    }

    pub fn with_client(client: Client, tz: Tz) -> Self {
        Self { client, tz }
    }

    /// Fetches both documents concurrently; the first failure aborts the load.
    pub async fn load(
        &self,
        events: &FeedSource,
        meta: Option<&FeedSource>,
    ) -> Result<Feed, FeedError> {
        let (events, catalog) = tokio::try_join!(self.load_events(events), async {
            match meta {
                Some(source) => self.load_catalog(source).await.map(Some),
                None => Ok(None),
            }
        })?;

        Ok(Feed { events, catalog })
    }

    async fn load_events(&self, source: &FeedSource) -> Result<Vec<Event>, FeedError> {
        let payload = base::fetch_json(&self.client, source).await?;
        let events = base::parse_events(base::normalize_events(payload), self.tz);
        info!(count = events.len(), %source, "loaded events");
        Ok(events)
    }

    async fn load_catalog(&self, source: &FeedSource) -> Result<Catalog, FeedError> {
        let payload = base::fetch_json(&self.client, source).await?;
        let catalog: Catalog = serde_json::from_value(payload).map_err(|err| FeedError::Parse {
            source_name: source.to_string(),
            message: err.to_string(),
        })?;
        info!(
            cities = catalog.cities.len(),
            styles = catalog.styles.len(),
            types = catalog.types.len(),
            venues = catalog.venues.len(),
            %source,
            "loaded metadata"
        );
        Ok(catalog)
    }
}
