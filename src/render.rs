use clap::ValueEnum;
use serde_json::json;

use crate::view::{EventCard, Tag};

pub const EMPTY_MESSAGE: &str = "No events match your filters.";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading events.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

pub fn render(cards: &[EventCard], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(cards)),
        OutputFormat::Html => Ok(render_html(cards)),
        OutputFormat::Json => serde_json::to_string_pretty(cards),
    }
}

/// Stands in for the card list when the initial load fails.
pub fn render_load_error(format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => LOAD_ERROR_MESSAGE.to_string(),
        OutputFormat::Html => format!("<p class=\"events-error\">{LOAD_ERROR_MESSAGE}</p>"),
        OutputFormat::Json => json!({ "error": LOAD_ERROR_MESSAGE }).to_string(),
    }
}

pub fn render_text(cards: &[EventCard]) -> String {
    if cards.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    cards
        .iter()
        .map(text_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn text_card(card: &EventCard) -> String {
    let mut lines = vec![card.title.clone(), format!("  {}", card.when)];

    let tags: Vec<String> = [&card.type_tag, &card.style_tag]
        .into_iter()
        .flatten()
        .map(tag_text)
        .collect();
    if !tags.is_empty() {
        lines.push(format!("  {}", tags.join(" · ")));
    }

    let place: Vec<&str> = [&card.venue, &card.address, &card.city]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    if !place.is_empty() {
        lines.push(format!("  {}", place.join(", ")));
    }

    if let Some(link) = &card.link {
        lines.push(format!("  {link}"));
    }

    lines.join("\n")
}

fn tag_text(tag: &Tag) -> String {
    match &tag.emoji {
        Some(emoji) => format!("{emoji} {}", tag.label),
        None => tag.label.clone(),
    }
}

pub fn render_html(cards: &[EventCard]) -> String {
    if cards.is_empty() {
        return format!("<p>{EMPTY_MESSAGE}</p>");
    }

    cards.iter().map(html_card).collect::<Vec<_>>().join("\n")
}

fn html_card(card: &EventCard) -> String {
    let title = escape_html(&card.title);
    let mut out = String::from("<article class=\"event-card\">\n");

    out.push_str("  <div class=\"event-image-wrapper\">");
    if let Some(src) = card.image_url.as_deref().and_then(safe_url) {
        out.push_str(&format!(
            "<img src=\"{}\" alt=\"{title}\" class=\"event-image\" />",
            escape_html(src)
        ));
    }
    out.push_str("</div>\n");

    out.push_str("  <div class=\"event-content\">\n");
    out.push_str(&format!("    <h2 class=\"event-title\">{title}</h2>\n"));
    out.push_str(&format!(
        "    <div class=\"event-datetime\">{}</div>\n",
        escape_html(&card.when)
    ));

    out.push_str("    <div class=\"event-tags\">");
    if let Some(tag) = &card.style_tag {
        out.push_str(&html_tag(tag, "style-tag"));
    }
    if let Some(tag) = &card.type_tag {
        out.push_str(&html_tag(tag, "type-tag"));
    }
    out.push_str("</div>\n");

    out.push_str("    <div class=\"event-location\">");
    for (value, class) in [
        (&card.venue, "event-venue"),
        (&card.address, "event-address"),
        (&card.city, "event-city"),
    ] {
        if let Some(value) = value {
            out.push_str(&format!(
                "<span class=\"{class}\">{}</span>",
                escape_html(value)
            ));
        }
    }
    out.push_str("</div>\n");

    if let Some(href) = card.link.as_deref().and_then(safe_url) {
        out.push_str(&format!(
            "    <a href=\"{}\" target=\"_blank\" rel=\"noopener\" class=\"event-link\">More info</a>\n",
            escape_html(href)
        ));
    }

    out.push_str("  </div>\n</article>");
    out
}

fn html_tag(tag: &Tag, class: &str) -> String {
    format!(
        "<span class=\"event-tag {class}\">{}</span>",
        escape_html(&tag_text(tag))
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Only http(s) and scheme-less relative URLs are linked.
fn safe_url(url: &str) -> Option<&str> {
    let url = url.trim();
    match reqwest::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https").then_some(url),
        Err(_) => {
            let head = url.split(['/', '?', '#']).next().unwrap_or_default();
            (!head.contains(':')).then_some(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn card(title: &str) -> EventCard {
        EventCard {
            title: title.to_string(),
            when: "Wed, 1 May · 18:00–20:00".into(),
            start: "2024-05-01T18:00:00+12:00".into(),
            end: Some("2024-05-01T20:00:00+12:00".into()),
            type_tag: Some(Tag { label: "Class".into(), emoji: Some("📚".into()) }),
            style_tag: Some(Tag { label: "Salsa".into(), emoji: None }),
            city: Some("Wellington".into()),
            venue: Some("Town Hall".into()),
            address: None,
            image_url: Some("images/salsa.jpg".into()),
            link: Some("https://example.com/salsa".into()),
        }
    }

    #[test]
    fn empty_lists_render_the_empty_message() {
        assert_eq!(render_text(&[]), EMPTY_MESSAGE);
        assert_eq!(render_html(&[]), "<p>No events match your filters.</p>");
        assert_eq!(render(&[], OutputFormat::Json).expect("json"), "[]");
    }

    #[test]
    fn text_card_layout() {
        let text = render_text(&[card("Beginners Salsa")]);
        assert_eq!(
            text,
            "Beginners Salsa\n  Wed, 1 May · 18:00–20:00\n  📚 Class · Salsa\n  Town Hall, Wellington\n  https://example.com/salsa"
        );
    }

    #[test]
    fn html_escapes_interpolated_text() {
        let html = render_html(&[card("<script>alert('x')</script> & friends")]);
        let document = Html::parse_fragment(&html);

        let script = Selector::parse("script").expect("selector");
        assert_eq!(document.select(&script).count(), 0);

        let title = Selector::parse("h2.event-title").expect("selector");
        let text: String = document
            .select(&title)
            .next()
            .expect("title")
            .text()
            .collect();
        assert_eq!(text, "<script>alert('x')</script> & friends");

        let image = Selector::parse("img.event-image").expect("selector");
        let alt = document
            .select(&image)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .expect("alt");
        assert_eq!(alt, "<script>alert('x')</script> & friends");
    }

    #[test]
    fn html_card_structure() {
        let html = render_html(&[card("A"), card("B")]);
        let document = Html::parse_fragment(&html);
        let cards = Selector::parse("article.event-card").expect("selector");
        assert_eq!(document.select(&cards).count(), 2);

        let tags = Selector::parse(".event-tags .event-tag").expect("selector");
        let labels: Vec<String> = document
            .select(&tags)
            .take(2)
            .map(|tag| tag.text().collect())
            .collect();
        assert_eq!(labels, vec!["Salsa".to_string(), "📚 Class".to_string()]);

        let link = Selector::parse("a.event-link").expect("selector");
        let href = document
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .expect("href");
        assert_eq!(href, "https://example.com/salsa");
    }

    #[test]
    fn unsafe_urls_are_not_linked() {
        let mut hostile = card("Hostile");
        hostile.link = Some("javascript:alert(1)".into());
        hostile.image_url = Some("data:image/png;base64,AAAA".into());
        let html = render_html(&[hostile]);
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("<img"));
        assert!(!html.contains("event-link"));
    }

    #[test]
    fn safe_url_rules() {
        assert_eq!(safe_url("https://a.example/x"), Some("https://a.example/x"));
        assert_eq!(safe_url("/img/a.png"), Some("/img/a.png"));
        assert_eq!(safe_url("img/a.png?v=1:2"), Some("img/a.png?v=1:2"));
        assert_eq!(safe_url("JavaScript:alert(1)"), None);
        assert_eq!(safe_url("mailto:someone@example.com"), None);
    }

    #[test]
    fn json_output_is_the_card_list() {
        let json = render(&[card("A")], OutputFormat::Json).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value[0]["title"], "A");
        assert_eq!(value[0]["type_tag"]["label"], "Class");
        assert_eq!(value[0]["address"], serde_json::Value::Null);
    }

    #[test]
    fn load_error_output() {
        assert_eq!(render_load_error(OutputFormat::Text), LOAD_ERROR_MESSAGE);
        assert!(render_load_error(OutputFormat::Html).contains(LOAD_ERROR_MESSAGE));
        let value: serde_json::Value =
            serde_json::from_str(&render_load_error(OutputFormat::Json)).expect("json");
        assert_eq!(value["error"], LOAD_ERROR_MESSAGE);
    }
}
