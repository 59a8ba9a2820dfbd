use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::feed::Feed;
use crate::filter::{self, FilterOptions, FilterState, PastPolicy, Selection};
use crate::metadata::Catalog;
use crate::models::Event;
use crate::schedule;
use crate::view::EventCard;

/// Owns the loaded feed and the current filter selections. Every read
/// recomputes from the full event list; nothing is patched in place.
pub struct Board {
    events: Vec<Event>,
    catalog: Option<Catalog>,
    filter: FilterState,
    policy: PastPolicy,
    tz: Tz,
}

impl Board {
    pub fn new(feed: Feed, policy: PastPolicy, tz: Tz) -> Self {
        Self {
            events: feed.events,
            catalog: feed.catalog,
            filter: FilterState::default(),
            policy,
            tz,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_type(&mut self, value: &str) {
        self.filter.event_type = Selection::parse(value);
    }

    pub fn set_city(&mut self, value: &str) {
        self.filter.city = Selection::parse(value);
    }

    pub fn set_style(&mut self, value: &str) {
        self.filter.style = Selection::parse(value);
    }

    pub fn set_show_past(&mut self, show_past: bool) {
        self.filter.show_past = show_past;
    }

    pub fn options(&self) -> FilterOptions {
        filter::filter_options(&self.events, self.catalog.as_ref())
    }

    /// Filter, sort and build cards as of `now`.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<EventCard> {
        let cutoff = schedule::start_of_day(now, self.tz);
        let year = schedule::reference_year(now, self.tz);

        let kept = filter::apply(&self.events, &self.filter, self.policy, &cutoff);
        debug!(
            kept = kept.len(),
            total = self.events.len(),
            filter = ?self.filter,
            "applied filters"
        );

        schedule::sort_ascending_by_start(kept)
            .into_iter()
            .map(|event| EventCard::build(event, self.catalog.as_ref(), year))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::base::{normalize_events, parse_events};
    use chrono::TimeZone;
    use serde_json::json;

    fn board(policy: PastPolicy) -> Board {
        let tz = chrono_tz::Pacific::Auckland;
        let events = parse_events(
            normalize_events(json!({ "events": [
                { "title": "Workshop", "dateTime": "2024-05-04T10:00", "endDateTime": "2024-05-05T16:00", "type": "special", "city": "akl", "style": "salsa" },
                { "title": "Beginners", "dateTime": "2024-05-01T18:00", "endDateTime": "2024-05-01T19:00", "type": "class", "city": "wgtn", "style": "salsa" },
                { "title": "Social", "dateTime": "2024-05-03T20:00", "type": "social", "city": "wgtn", "style": "bachata" },
                { "title": "Late Social", "dateTime": "2024-05-03T20:00", "type": "social", "city": "chch", "style": "bachata" }
            ] })),
            tz,
        );
        let catalog = serde_json::from_value(json!({
            "cities": [
                { "id": "wgtn", "name": "Wellington" },
                { "id": "akl", "name": "Auckland" }
            ]
        }))
        .expect("catalog");
        Board::new(Feed { events, catalog: Some(catalog) }, policy, tz)
    }

    fn titles(cards: &[EventCard]) -> Vec<&str> {
        cards.iter().map(|card| card.title.as_str()).collect()
    }

    fn may(day: u32, hour: u32) -> DateTime<Utc> {
        // NZST is UTC+12 in May.
        chrono_tz::Pacific::Auckland
            .with_ymd_and_hms(2024, 5, day, hour, 0, 0)
            .single()
            .expect("time")
            .with_timezone(&Utc)
    }

    #[test]
    fn unfiltered_board_is_sorted_by_start() {
        let mut board = board(PastPolicy::End);
        board.set_show_past(true);
        let cards = board.visible(may(10, 12));
        assert_eq!(titles(&cards), vec!["Beginners", "Social", "Late Social", "Workshop"]);
    }

    #[test]
    fn past_events_drop_out_relative_to_local_midnight() {
        let board = board(PastPolicy::End);
        // Late evening on the 4th: only the workshop has not ended before today.
        let cards = board.visible(may(4, 23));
        assert_eq!(titles(&cards), vec!["Workshop"]);

        let board_off = self::board(PastPolicy::Off);
        assert_eq!(board_off.visible(may(30, 12)).len(), 4);
    }

    #[test]
    fn setters_drive_the_filter_state() {
        let mut board = board(PastPolicy::End);
        board.set_show_past(true);
        board.set_city(" WGTN ");
        board.set_style("Salsa");
        assert_eq!(titles(&board.visible(may(10, 12))), vec!["Beginners"]);

        board.set_style("all");
        board.set_type("social");
        assert_eq!(titles(&board.visible(may(10, 12))), vec!["Social"]);
        assert_eq!(board.filter_state().city, Selection::Only("WGTN".into()));
    }

    #[test]
    fn unknown_city_id_renders_raw_text() {
        let mut board = board(PastPolicy::End);
        board.set_show_past(true);
        board.set_city("chch");
        let cards = board.visible(may(10, 12));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].city.as_deref(), Some("chch"));
        assert_eq!(cards[0].when, "Fri, 3 May · 20:00");
    }

    #[test]
    fn options_use_catalog_cities_and_feed_styles() {
        let board = board(PastPolicy::End);
        let options = board.options();
        let cities: Vec<&str> = options.cities.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(cities, vec!["All", "Wellington", "Auckland"]);
        let styles: Vec<&str> = options.styles.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(styles, vec!["all", "bachata", "salsa"]);
        assert_eq!(board.events().len(), 4);
        assert!(board.catalog().is_some());
    }
}
