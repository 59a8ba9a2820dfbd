use std::{fs, path::PathBuf, sync::Mutex, time::Duration};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::filter::PastPolicy;
use crate::utils;

const DEFAULT_EVENTS_URL: &str = "events.json";
const DEFAULT_TIMEZONE: &str = "Pacific/Auckland";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

pub const KEYS: [&str; 5] = [
    "events_url",
    "meta_url",
    "timezone",
    "past_policy",
    "request_timeout_secs",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub events_url: String,
    pub meta_url: Option<String>,
    pub timezone: String,
    pub past_policy: PastPolicy,
    /// Zero disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            events_url: DEFAULT_EVENTS_URL.to_string(),
            meta_url: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            past_policy: PastPolicy::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Environment variables override file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("EVENT_BOARD_EVENTS_URL") {
            self.events_url = url;
        }
        if let Some(url) = lookup("EVENT_BOARD_META_URL") {
            self.meta_url = Some(url);
        }
        if let Some(tz) = lookup("EVENT_BOARD_TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(policy) = lookup("EVENT_BOARD_PAST_POLICY").and_then(|s| s.parse().ok()) {
            self.past_policy = policy;
        }
        if let Some(secs) = lookup("EVENT_BOARD_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            self.request_timeout_secs = secs;
        }
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.timezone)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "events_url" => self.events_url.clone(),
            "meta_url" => self.meta_url.clone().unwrap_or_default(),
            "timezone" => self.timezone.clone(),
            "past_policy" => self.past_policy.as_str().to_string(),
            "request_timeout_secs" => self.request_timeout_secs.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// An empty `meta_url` clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        match key {
            "events_url" => {
                if value.is_empty() {
                    return Err(invalid("events_url cannot be empty".to_string()));
                }
                self.events_url = value.to_string();
            }
            "meta_url" => {
                self.meta_url = (!value.is_empty()).then(|| value.to_string());
            }
            "timezone" => {
                parse_timezone(value)?;
                self.timezone = value.to_string();
            }
            "past_policy" => {
                self.past_policy = value.parse().map_err(invalid)?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = value
                    .parse()
                    .map_err(|err: std::num::ParseIntError| invalid(err.to_string()))?;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|err| ConfigError::InvalidValue {
            key: "timezone".to_string(),
            message: err.to_string(),
        })
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(utils::config_path())
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let data = read_config(&path)?;
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn read(&self) -> Result<AppConfig, ConfigError> {
        self.data
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| ConfigError::Poisoned)
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig) -> Result<(), ConfigError>,
    {
        let mut guard = self.data.lock().map_err(|_| ConfigError::Poisoned)?;
        let mut next = guard.clone();
        transform(&mut next)?;
        write_config(&self.path, &next)?;
        *guard = next;
        Ok(guard.clone())
    }
}

fn read_config(path: &PathBuf) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    serde_json::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))
}

fn write_config(path: &PathBuf, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| ConfigError::Io(err.to_string()))?;
    }
    let contents =
        serde_json::to_string_pretty(config).map_err(|err| ConfigError::Parse(err.to_string()))?;
    fs::write(path, contents).map_err(|err| ConfigError::Io(err.to_string()))
}
