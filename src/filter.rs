use std::collections::HashSet;
use std::str::FromStr;

use chrono::DateTime;
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::metadata::{Catalog, CatalogEntry, Category};
use crate::models::Event;
use crate::utils::{clean_text, match_key, non_empty};

/// Wire value of the "no restriction" selection.
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// `"all"` (any casing) and blank input both mean no restriction.
    pub fn parse(value: &str) -> Self {
        let key = match_key(value);
        if key.is_empty() || key == ALL {
            Selection::All
        } else {
            Selection::Only(value.trim().to_string())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value
                .map(|value| match_key(value) == match_key(wanted))
                .unwrap_or(false),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Only(value) => value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub event_type: Selection,
    pub city: Selection,
    pub style: Selection,
    pub show_past: bool,
}

/// Which timestamp decides whether an event is already over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PastPolicy {
    /// End time when present, otherwise the start.
    #[default]
    End,
    /// Start time only.
    Start,
    /// Never hide past events.
    Off,
}

impl PastPolicy {
    fn relevant<'a>(&self, event: &'a Event) -> Option<&'a DateTime<Tz>> {
        match self {
            PastPolicy::End => Some(event.end.as_ref().unwrap_or(&event.start)),
            PastPolicy::Start => Some(&event.start),
            PastPolicy::Off => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PastPolicy::End => "end",
            PastPolicy::Start => "start",
            PastPolicy::Off => "off",
        }
    }
}

impl FromStr for PastPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match match_key(value).as_str() {
            "end" => Ok(PastPolicy::End),
            "start" => Ok(PastPolicy::Start),
            "off" | "none" => Ok(PastPolicy::Off),
            other => Err(format!("expected end, start or off, got {other:?}")),
        }
    }
}

/// Keeps the events matching every active selection, in input order.
/// `cutoff` is local midnight today; it is ignored when `show_past` is set
/// or the policy is `Off`.
pub fn apply<'a>(
    events: &'a [Event],
    filter: &FilterState,
    policy: PastPolicy,
    cutoff: &DateTime<Tz>,
) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| filter.event_type.matches(event.field(Category::Type)))
        .filter(|event| filter.city.matches(event.field(Category::City)))
        .filter(|event| filter.style.matches(event.field(Category::Style)))
        .filter(|event| filter.show_past || is_current(event, policy, cutoff))
        .collect()
}

fn is_current(event: &Event, policy: PastPolicy, cutoff: &DateTime<Tz>) -> bool {
    match policy.relevant(event) {
        Some(when) => when >= cutoff,
        None => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn all() -> Self {
        Self {
            value: ALL.to_string(),
            label: "All".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub types: Vec<SelectOption>,
    pub cities: Vec<SelectOption>,
    pub styles: Vec<SelectOption>,
}

/// Distinct values present in the feed, case-insensitively deduplicated
/// (first spelling wins) and sorted, behind the "all" option. Values keep
/// the field text as matched by `apply`; only labels are whitespace-cleaned.
pub fn derive_options(events: &[Event], category: Category) -> Vec<SelectOption> {
    let mut seen = HashSet::new();
    let mut options: Vec<SelectOption> = Vec::new();

    for event in events {
        let Some(raw) = event.field(category) else {
            continue;
        };
        let key = match_key(raw);
        if key == ALL || !seen.insert(key) {
            continue;
        }
        options.push(SelectOption {
            value: raw.trim().to_string(),
            label: clean_text(raw),
        });
    }

    options.sort_by_cached_key(|option| option.label.to_lowercase());

    std::iter::once(SelectOption::all()).chain(options).collect()
}

/// Catalog entries in catalog order, valued by id.
pub fn catalog_options(entries: &[CatalogEntry]) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::all()];
    for entry in entries {
        let Some(id) = non_empty(entry.id.as_deref()) else {
            continue;
        };
        let name = entry.display_name().unwrap_or(id);
        let label = match entry.emoji() {
            Some(emoji) => format!("{emoji} {name}"),
            None => name.to_string(),
        };
        options.push(SelectOption {
            value: id.to_string(),
            label,
        });
    }
    options
}

pub fn options_for(
    events: &[Event],
    catalog: Option<&Catalog>,
    category: Category,
) -> Vec<SelectOption> {
    match catalog.map(|catalog| catalog.entries(category)) {
        Some(entries) if !entries.is_empty() => catalog_options(entries),
        _ => derive_options(events, category),
    }
}

pub fn filter_options(events: &[Event], catalog: Option<&Catalog>) -> FilterOptions {
    FilterOptions {
        types: options_for(events, catalog, Category::Type),
        cities: options_for(events, catalog, Category::City),
        styles: options_for(events, catalog, Category::Style),
    }
}
