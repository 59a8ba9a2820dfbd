use serde::Serialize;

use crate::metadata::{self, Catalog, Category};
use crate::models::Event;
use crate::schedule;
use crate::utils::non_empty;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub label: String,
    pub emoji: Option<String>,
}

/// Everything a renderer needs for one card, with lookups already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCard {
    pub title: String,
    pub when: String,
    pub start: String,
    pub end: Option<String>,
    pub type_tag: Option<Tag>,
    pub style_tag: Option<Tag>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

impl EventCard {
    pub fn build(event: &Event, catalog: Option<&Catalog>, reference_year: i32) -> Self {
        let venue_entry = metadata::resolve(catalog, Category::Venue, event.field(Category::Venue));
        let venue = venue_entry
            .and_then(|entry| entry.display_name())
            .or_else(|| non_empty(event.location.as_deref()))
            .or_else(|| event.field(Category::Venue))
            .map(str::to_string);

        Self {
            title: event.title().to_string(),
            when: schedule::format_range(&event.start, event.end.as_ref(), reference_year),
            start: event.start.to_rfc3339(),
            end: event.end.as_ref().map(|end| end.to_rfc3339()),
            type_tag: tag(event, catalog, Category::Type),
            style_tag: tag(event, catalog, Category::Style),
            city: label(event, catalog, Category::City),
            venue,
            address: venue_entry
                .and_then(|entry| entry.address())
                .map(str::to_string),
            image_url: non_empty(event.image_url.as_deref()).map(str::to_string),
            link: non_empty(event.link.as_deref()).map(str::to_string),
        }
    }
}

/// Resolved display name, or the raw field text when the lookup misses.
fn label(event: &Event, catalog: Option<&Catalog>, category: Category) -> Option<String> {
    let raw = event.field(category)?;
    let resolved = metadata::resolve(catalog, category, Some(raw)).and_then(|entry| entry.display_name());
    Some(resolved.unwrap_or(raw).to_string())
}

/// Label and emoji both come from the single resolved entry.
fn tag(event: &Event, catalog: Option<&Catalog>, category: Category) -> Option<Tag> {
    let raw = event.field(category)?;
    let entry = metadata::resolve(catalog, category, Some(raw));
    Some(Tag {
        label: entry
            .and_then(|entry| entry.display_name())
            .unwrap_or(raw)
            .to_string(),
        emoji: entry.and_then(|entry| entry.emoji()).map(str::to_string),
    })
}
