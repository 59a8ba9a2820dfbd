use dirs::data_dir;
use once_cell::sync::Lazy;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "EVENT_BOARD_CONFIG";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("event-board")
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => data_root().join("config.json"),
    }
}

/// Collapses runs of whitespace into single spaces.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key for filter matching: trimmed and lower-cased.
pub fn match_key(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_key_ignores_case_and_padding() {
        assert_eq!(match_key(" Wellington "), "wellington");
        assert_eq!(match_key("WELLINGTON"), match_key("wellington"));
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Salsa \n  Social\t"), "Salsa Social");
    }

    #[test]
    fn non_empty_drops_blank_values() {
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x"));
        assert_eq!(non_empty(None), None);
    }
}
