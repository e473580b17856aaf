//! Intent classification
//!
//! A command matches the first rule in [`RULES`] whose trigger phrase occurs
//! anywhere in it. Declaration order decides, not the position of the phrase
//! in the text. Arguments are cut out of the text that follows the trigger.

use regex::Regex;
use std::sync::OnceLock;

/// Fieldless intent discriminant, used by the rule table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntentKind {
    TimeQuery,
    JokeQuery,
    NameQuery,
    WeatherQuery,
    NewsQuery,
    TimerSet,
    TimerStop,
    AppOpen,
    AppAdd,
    AppRemove,
    PlaylistPlay,
    PlayMusic,
    PauseMusic,
    ResumeMusic,
    StopMusic,
    NextTrack,
    PrevTrack,
    VolumeUp,
    VolumeDown,
    CameraOpen,
    CameraClose,
    Fallback,
}

/// Ordered (trigger phrase, intent) rules; first match wins
pub const RULES: &[(&str, IntentKind)] = &[
    ("what time is it", IntentKind::TimeQuery),
    ("tell me a joke", IntentKind::JokeQuery),
    ("what's your name", IntentKind::NameQuery),
    ("what's the weather in", IntentKind::WeatherQuery),
    ("tell me the news", IntentKind::NewsQuery),
    ("set a timer for", IntentKind::TimerSet),
    ("stop timer", IntentKind::TimerStop),
    ("open app", IntentKind::AppOpen),
    ("add app", IntentKind::AppAdd),
    ("remove app", IntentKind::AppRemove),
    ("play playlist", IntentKind::PlaylistPlay),
    ("play music", IntentKind::PlayMusic),
    ("pause music", IntentKind::PauseMusic),
    ("resume music", IntentKind::ResumeMusic),
    ("stop music", IntentKind::StopMusic),
    ("next track", IntentKind::NextTrack),
    ("previous track", IntentKind::PrevTrack),
    ("increase volume", IntentKind::VolumeUp),
    ("decrease volume", IntentKind::VolumeDown),
    ("open camera", IntentKind::CameraOpen),
    ("close camera", IntentKind::CameraClose),
];

const SEARCH_SEPARATOR: &str = " and search for ";

/// A classified command with its extracted arguments
///
/// Empty strings mean the user left the slot out; handlers turn those into
/// clarification replies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    TimeQuery,
    JokeQuery,
    NameQuery,
    WeatherQuery { city: String },
    NewsQuery,
    /// `None` when no positive whole number was spoken; saturates at `u64::MAX`
    TimerSet { minutes: Option<u64> },
    TimerStop,
    AppOpen { app: String, search: Option<String> },
    AppAdd { name: String, url: String },
    AppRemove { name: String },
    PlaylistPlay { name: String },
    PlayMusic,
    PauseMusic,
    ResumeMusic,
    StopMusic,
    NextTrack,
    PrevTrack,
    VolumeUp,
    VolumeDown,
    CameraOpen,
    CameraClose,
    Fallback,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::TimeQuery => IntentKind::TimeQuery,
            Intent::JokeQuery => IntentKind::JokeQuery,
            Intent::NameQuery => IntentKind::NameQuery,
            Intent::WeatherQuery { .. } => IntentKind::WeatherQuery,
            Intent::NewsQuery => IntentKind::NewsQuery,
            Intent::TimerSet { .. } => IntentKind::TimerSet,
            Intent::TimerStop => IntentKind::TimerStop,
            Intent::AppOpen { .. } => IntentKind::AppOpen,
            Intent::AppAdd { .. } => IntentKind::AppAdd,
            Intent::AppRemove { .. } => IntentKind::AppRemove,
            Intent::PlaylistPlay { .. } => IntentKind::PlaylistPlay,
            Intent::PlayMusic => IntentKind::PlayMusic,
            Intent::PauseMusic => IntentKind::PauseMusic,
            Intent::ResumeMusic => IntentKind::ResumeMusic,
            Intent::StopMusic => IntentKind::StopMusic,
            Intent::NextTrack => IntentKind::NextTrack,
            Intent::PrevTrack => IntentKind::PrevTrack,
            Intent::VolumeUp => IntentKind::VolumeUp,
            Intent::VolumeDown => IntentKind::VolumeDown,
            Intent::CameraOpen => IntentKind::CameraOpen,
            Intent::CameraClose => IntentKind::CameraClose,
            Intent::Fallback => IntentKind::Fallback,
        }
    }
}

/// Lower-case and trim a raw transcript
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Classify a command; never fails, unmatched text yields [`Intent::Fallback`]
pub fn classify(command: &str) -> Intent {
    let command = normalize(command);

    let Some((phrase, kind)) = RULES.iter().find(|(phrase, _)| command.contains(phrase)) else {
        return Intent::Fallback;
    };

    let rest = segment_after(&command, phrase);

    match kind {
        IntentKind::TimeQuery => Intent::TimeQuery,
        IntentKind::JokeQuery => Intent::JokeQuery,
        IntentKind::NameQuery => Intent::NameQuery,
        IntentKind::WeatherQuery => Intent::WeatherQuery {
            city: rest.to_string(),
        },
        IntentKind::NewsQuery => Intent::NewsQuery,
        IntentKind::TimerSet => Intent::TimerSet {
            minutes: first_number(&command),
        },
        IntentKind::TimerStop => Intent::TimerStop,
        IntentKind::AppOpen => {
            let mut parts = rest.split(SEARCH_SEPARATOR);
            let app = parts.next().unwrap_or_default().trim().to_string();
            let search = parts
                .next()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string);
            Intent::AppOpen { app, search }
        }
        IntentKind::AppAdd => {
            let mut parts = rest.split(' ');
            let name = parts.next().unwrap_or_default().to_string();
            let url = parts.collect::<Vec<_>>().join(" ");
            Intent::AppAdd { name, url }
        }
        IntentKind::AppRemove => Intent::AppRemove {
            name: rest.to_string(),
        },
        IntentKind::PlaylistPlay => Intent::PlaylistPlay {
            name: if rest.is_empty() {
                crate::playlist::DEFAULT_PLAYLIST.to_string()
            } else {
                rest.to_string()
            },
        },
        IntentKind::PlayMusic => Intent::PlayMusic,
        IntentKind::PauseMusic => Intent::PauseMusic,
        IntentKind::ResumeMusic => Intent::ResumeMusic,
        IntentKind::StopMusic => Intent::StopMusic,
        IntentKind::NextTrack => Intent::NextTrack,
        IntentKind::PrevTrack => Intent::PrevTrack,
        IntentKind::VolumeUp => Intent::VolumeUp,
        IntentKind::VolumeDown => Intent::VolumeDown,
        IntentKind::CameraOpen => Intent::CameraOpen,
        IntentKind::CameraClose => Intent::CameraClose,
        IntentKind::Fallback => Intent::Fallback,
    }
}

/// Trimmed text between the first occurrence of `phrase` and the next one
fn segment_after<'a>(command: &'a str, phrase: &str) -> &'a str {
    command
        .split(phrase)
        .nth(1)
        .map(str::trim)
        .unwrap_or_default()
}

/// First run of ASCII digits anywhere in the command; zero counts as absent
///
/// Digit runs too long for `u64` saturate so the handler can reject them.
fn first_number(command: &str) -> Option<u64> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("valid digit pattern"));

    digits
        .find(command)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .filter(|&n| n > 0)
}
