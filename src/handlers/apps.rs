//! App shortcut handlers: open, add, remove and settings save

use super::{CommandError, HandlerResult};
use crate::effects::{Outcome, SideEffect};
use crate::store::ShortcutStore;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

pub const APP_NOT_FOUND: &str = "App not found.";

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://.+").expect("valid url pattern"))
}

/// Site-specific search URL for apps that support it
fn search_url(app: &str, query: &str) -> Option<String> {
    let query = urlencoding::encode(query);
    match app {
        "youtube" => Some(format!(
            "https://www.youtube.com/results?search_query={}",
            query
        )),
        "maps" => Some(format!("https://www.google.com/maps/search/{}", query)),
        _ => None,
    }
}

pub fn open(shortcuts: &ShortcutStore, app: &str, search: Option<&str>) -> HandlerResult {
    if app.is_empty() {
        return Err(CommandError::missing("Please specify an app."));
    }

    if let Some(stored) = shortcuts.get(app) {
        let url = search
            .and_then(|q| search_url(app, q))
            .unwrap_or_else(|| stored.to_string());

        let response = match search {
            Some(query) => format!("Opening {} and searching for {}.", app, query),
            None => format!("Opening {}.", app),
        };
        return Ok(Outcome::say(response).with_effect(SideEffect::OpenUrl { url }));
    }

    if app.starts_with("http") {
        return Ok(Outcome::say(format!("Opening custom URL: {}.", app))
            .with_effect(SideEffect::OpenUrl {
                url: app.to_string(),
            }));
    }

    Err(CommandError::not_found(APP_NOT_FOUND))
}

pub fn add(shortcuts: &mut ShortcutStore, name: &str, url: &str) -> HandlerResult {
    if name.is_empty() || url.is_empty() {
        return Err(CommandError::missing(
            "Please provide both an app name and a URL.",
        ));
    }
    if !url_pattern().is_match(url) {
        return Err(CommandError::InvalidInput(
            "Invalid URL. Use 'http://' or 'https://'.".to_string(),
        ));
    }

    if let Err(e) = shortcuts.upsert(name, url) {
        warn!("App {} added but not persisted: {}", name, e);
    }
    Ok(Outcome::say(format!("Added app {} with URL {}.", name, url)))
}

pub fn remove(shortcuts: &mut ShortcutStore, name: &str) -> HandlerResult {
    if name.is_empty() || !shortcuts.contains(name) {
        return Err(CommandError::not_found(APP_NOT_FOUND));
    }

    if let Err(e) = shortcuts.remove(name) {
        warn!("App {} removed but not persisted: {}", name, e);
    }
    Ok(Outcome::say(format!("Removed app {}.", name)))
}

pub fn save_settings(shortcuts: &mut ShortcutStore, entries: Vec<(String, String)>) -> Outcome {
    if let Err(e) = shortcuts.apply_settings(entries) {
        warn!("Settings applied but not persisted: {}", e);
    }
    Outcome::say("Settings saved.")
}
