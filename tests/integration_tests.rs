//! End-to-end tests driving the orchestrator through its handle
//!
//! Outputs are recorded in memory and countdown ticks are fired by hand, so
//! these run without audio, network or real time passing.

use parking_lot::Mutex;
use parley::capabilities::{
    AudioPlayback, FetchError, ManualClock, NetworkFetch, SpeechInputError, SpeechOutput,
    SpeechOutputError, UnavailableCamera,
};
use parley::handlers::apps::APP_NOT_FOUND;
use parley::handlers::info::HELP;
use parley::handlers::music::PLAYLIST_NOT_FOUND;
use parley::handlers::Services;
use parley::session::PlaybackState;
use parley::store::{MemoryStore, ShortcutStore};
use parley::{
    AssistantCommand, AssistantConfig, AssistantEvent, Dispatcher, Orchestrator,
    OrchestratorHandle, Outputs, SideEffect,
};
use serde_json::Value;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

struct RecordingSpeech(Arc<Mutex<Vec<String>>>);

impl SpeechOutput for RecordingSpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechOutputError> {
        self.0.lock().push(text.to_string());
        Ok(())
    }
}

struct RecordingPlayback(Arc<Mutex<Vec<String>>>);

impl AudioPlayback for RecordingPlayback {
    fn play(&mut self, locator: &str) {
        self.0.lock().push(format!("play {}", locator));
    }

    fn pause(&mut self) {
        self.0.lock().push("pause".to_string());
    }

    fn resume(&mut self) {
        self.0.lock().push("resume".to_string());
    }

    fn stop(&mut self) {
        self.0.lock().push("stop".to_string());
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.lock().push(format!("volume {:.1}", volume));
    }
}

struct OfflineFetch;

impl NetworkFetch for OfflineFetch {
    fn get_json(&self, _url: &str) -> Result<Value, FetchError> {
        Err(FetchError::Network("offline".to_string()))
    }
}

/// A running assistant plus everything the test needs to observe it
struct Harness {
    handle: OrchestratorHandle,
    clock: ManualClock,
    spoken: Arc<Mutex<Vec<String>>>,
    playback: Arc<Mutex<Vec<String>>>,
    worker: Option<JoinHandle<()>>,
}

impl Harness {
    fn start(store: &MemoryStore) -> Self {
        let clock = ManualClock::default();
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let playback = Arc::new(Mutex::new(Vec::new()));

        let config = AssistantConfig::default().with_channel_buffer_size(1000);
        let shortcuts = ShortcutStore::load(Box::new(store.clone()));
        let services = Services {
            network: Box::new(OfflineFetch),
            camera: Box::new(UnavailableCamera),
            clock: Box::new(clock.clone()),
        };
        let dispatcher = Dispatcher::new(config, shortcuts, services);

        let (orchestrator, handle) = Orchestrator::new(
            dispatcher,
            Outputs {
                speech: Box::new(RecordingSpeech(spoken.clone())),
                playback: Box::new(RecordingPlayback(playback.clone())),
            },
        );
        let worker = orchestrator.start();

        Self {
            handle,
            clock,
            spoken,
            playback,
            worker: Some(worker),
        }
    }

    /// Send an utterance and collect effects up to its spoken response
    fn say(&self, text: &str) -> (String, Vec<SideEffect>) {
        self.handle.utterance(text).unwrap();
        self.next_response()
    }

    fn next_response(&self) -> (String, Vec<SideEffect>) {
        let mut effects = Vec::new();
        loop {
            match self.handle.recv_event_timeout(WAIT).unwrap() {
                AssistantEvent::Response { speech, .. } => return (speech, effects),
                AssistantEvent::Effect(effect) => effects.push(effect),
                _ => {}
            }
        }
    }

    fn next_effect(&self) -> SideEffect {
        loop {
            match self.handle.recv_event_timeout(WAIT).unwrap() {
                AssistantEvent::Effect(effect) => return effect,
                AssistantEvent::Response { speech, .. } => panic!("Unexpected reply: {}", speech),
                _ => {}
            }
        }
    }

    fn shutdown(&mut self) -> Vec<SideEffect> {
        self.handle.shutdown().unwrap();
        let mut effects = Vec::new();
        loop {
            match self.handle.recv_event_timeout(WAIT).unwrap() {
                AssistantEvent::Shutdown => break,
                AssistantEvent::Effect(effect) => effects.push(effect),
                _ => {}
            }
        }
        if let Some(worker) = self.worker.take() {
            worker.join().unwrap();
        }
        effects
    }
}

#[test]
fn test_timer_counts_down_to_alert() {
    let mut harness = Harness::start(&MemoryStore::new());

    let (reply, effects) = harness.say("Set a timer for 2");
    assert_eq!(reply, "Timer set for 2 minutes.");
    assert_eq!(
        effects,
        vec![
            SideEffect::ShowTimer { remaining: 120 },
            SideEffect::StartTicker
        ]
    );
    assert_eq!(harness.handle.session().timer_remaining_seconds(), Some(120));

    assert_eq!(harness.clock.advance(120), 120);

    let (reply, effects) = harness.next_response();
    assert_eq!(reply, "Time's up!");

    let shown: Vec<u64> = effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::ShowTimer { remaining } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert_eq!(shown.len(), 119);
    assert_eq!(shown.first(), Some(&119));
    assert_eq!(shown.last(), Some(&1));
    assert!(effects.contains(&SideEffect::PlayBeep));
    assert!(effects.contains(&SideEffect::HideTimer));

    assert!(!harness.handle.session().timer_active());
    assert_eq!(
        harness.spoken.lock().last().map(String::as_str),
        Some("Time's up!")
    );

    harness.shutdown();
    assert!(!harness.clock.tick());
}

#[test]
fn test_stop_timer_twice() {
    let mut harness = Harness::start(&MemoryStore::new());

    harness.say("set a timer for 1");
    let (reply, effects) = harness.say("stop timer");
    assert_eq!(reply, "Timer stopped.");
    assert_eq!(effects, vec![SideEffect::CancelTicker, SideEffect::HideTimer]);

    let (reply, effects) = harness.say("stop timer");
    assert_eq!(reply, "No active timer to stop.");
    assert!(effects.is_empty());

    harness.shutdown();
}

#[test]
fn test_open_youtube_with_search() {
    let mut harness = Harness::start(&MemoryStore::new());

    let (reply, effects) = harness.say("open app youtube and search for rust tutorials");
    assert_eq!(reply, "Opening youtube and searching for rust tutorials.");
    assert_eq!(
        effects,
        vec![SideEffect::OpenUrl {
            url: "https://www.youtube.com/results?search_query=rust%20tutorials".to_string()
        }]
    );

    harness.shutdown();
}

#[test]
fn test_unrecognized_command_gets_help() {
    let mut harness = Harness::start(&MemoryStore::new());

    let (reply, effects) = harness.say("sing me a song");
    assert_eq!(reply, HELP);
    assert!(effects.is_empty());

    harness.shutdown();
}

#[test]
fn test_unknown_playlist_keeps_state() {
    let mut harness = Harness::start(&MemoryStore::new());

    let (reply, effects) = harness.say("play playlist jazz");
    assert_eq!(reply, PLAYLIST_NOT_FOUND);
    assert!(effects.is_empty());
    assert_eq!(harness.handle.session().playback(), PlaybackState::Idle);
    assert!(harness.playback.lock().is_empty());

    harness.shutdown();
}

#[test]
fn test_volume_saturates_at_maximum() {
    let mut harness = Harness::start(&MemoryStore::new());

    let replies: Vec<String> = (0..6).map(|_| harness.say("increase volume").0).collect();

    assert_eq!(replies[0], "Volume increased to 60%.");
    assert_eq!(replies[4], "Volume increased to 100%.");
    assert_eq!(replies[5], "Volume is already at maximum.");
    assert_eq!(harness.handle.session().volume(), 1.0);
    assert_eq!(harness.playback.lock().len(), 5);

    harness.shutdown();
}

#[test]
fn test_music_session() {
    let mut harness = Harness::start(&MemoryStore::new());

    let (reply, _) = harness.say("play music");
    assert_eq!(reply, "Playing Track 1 from default playlist.");
    assert_eq!(
        *harness.playback.lock(),
        vec![
            "play https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3".to_string(),
            "volume 0.5".to_string(),
        ]
    );

    harness.handle.track_ended().unwrap();
    assert_eq!(
        harness.next_effect(),
        SideEffect::PlayAudio {
            locator: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3".to_string()
        }
    );
    assert_eq!(harness.handle.session().snapshot().track_index, 1);

    assert_eq!(harness.say("pause music").0, "Music paused.");
    // Advancing on track end is not announced
    assert_eq!(
        *harness.spoken.lock(),
        vec![
            "Playing Track 1 from default playlist.".to_string(),
            "Music paused.".to_string(),
        ]
    );
    assert_eq!(harness.handle.session().playback(), PlaybackState::Paused);
    assert_eq!(harness.say("resume music").0, "Music resumed.");
    assert_eq!(harness.say("previous track").0, "Playing previous track: Track 1.");

    harness.shutdown();
}

#[test]
fn test_shortcuts_persist_across_sessions() {
    let store = MemoryStore::new();

    let mut harness = Harness::start(&store);
    let (reply, _) = harness.say("add app github https://github.com");
    assert_eq!(reply, "Added app github with URL https://github.com.");
    harness.shutdown();

    assert_eq!(
        ShortcutStore::load(Box::new(store.clone())).get("github"),
        Some("https://github.com")
    );

    let mut harness = Harness::start(&store);
    let (_, effects) = harness.say("open app github");
    assert_eq!(
        effects,
        vec![SideEffect::OpenUrl {
            url: "https://github.com".to_string()
        }]
    );
    assert_eq!(harness.say("remove app github").0, "Removed app github.");
    assert_eq!(harness.say("open app github").0, APP_NOT_FOUND);
    harness.shutdown();

    assert!(!ShortcutStore::load(Box::new(store)).contains("github"));
}

#[test]
fn test_settings_round_trip() {
    let mut harness = Harness::start(&MemoryStore::new());

    harness.handle.request_settings().unwrap();
    let entries = match harness.handle.recv_event_timeout(WAIT).unwrap() {
        AssistantEvent::Settings(entries) => entries,
        other => panic!("Expected settings, got {:?}", other),
    };
    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0].0, "calculator");

    harness
        .handle
        .save_settings(vec![
            ("notes".to_string(), "https://notes.example.com".to_string()),
            ("blank".to_string(), "   ".to_string()),
        ])
        .unwrap();
    assert_eq!(harness.next_response().0, "Settings saved.");

    harness.handle.request_settings().unwrap();
    match harness.handle.recv_event_timeout(WAIT).unwrap() {
        AssistantEvent::Settings(entries) => {
            assert_eq!(entries.len(), 9);
            assert!(entries.iter().any(|(name, _)| name == "notes"));
            assert!(!entries.iter().any(|(name, _)| name == "blank"));
        }
        other => panic!("Expected settings, got {:?}", other),
    }

    harness.shutdown();
}

#[test]
fn test_earlier_rule_wins() {
    let mut harness = Harness::start(&MemoryStore::new());

    // Both phrases present; the weather rule is declared before the news rule
    let (reply, _) = harness.say("what's the weather in the news");
    assert_eq!(
        reply,
        "Please set a valid OpenWeatherMap API key in the configuration."
    );

    let (reply, _) = harness.say("stop music and stop timer");
    assert_eq!(reply, "No active timer to stop.");

    harness.shutdown();
}

#[test]
fn test_camera_failure_is_spoken() {
    let mut harness = Harness::start(&MemoryStore::new());

    let (reply, effects) = harness.say("open camera");
    assert_eq!(
        reply,
        "Failed to open camera. Ensure camera permission is granted."
    );
    assert!(effects.is_empty());
    assert!(!harness.handle.session().camera_active());

    harness.shutdown();
}

#[test]
fn test_shutdown_cancels_running_timer() {
    let mut harness = Harness::start(&MemoryStore::new());

    harness.say("set a timer for 3");
    let effects = harness.shutdown();

    assert_eq!(effects, vec![SideEffect::CancelTicker, SideEffect::HideTimer]);
    assert!(!harness.handle.session().timer_active());
}

#[test]
fn test_listening_failures_are_reported() {
    let mut harness = Harness::start(&MemoryStore::new());

    harness
        .handle
        .send_command(AssistantCommand::ListenFailed(SpeechInputError::NoSpeech))
        .unwrap();
    assert_eq!(
        harness.handle.recv_event_timeout(WAIT).unwrap(),
        AssistantEvent::ListeningError("Error: no-speech".to_string())
    );

    harness
        .handle
        .send_command(AssistantCommand::ListenFailed(SpeechInputError::Recognition(
            "network".to_string(),
        )))
        .unwrap();
    assert_eq!(
        harness.handle.recv_event_timeout(WAIT).unwrap(),
        AssistantEvent::ListeningError("Error: network".to_string())
    );

    harness
        .handle
        .send_command(AssistantCommand::ListenFailed(SpeechInputError::Unsupported))
        .unwrap();
    assert_eq!(
        harness.handle.recv_event_timeout(WAIT).unwrap(),
        AssistantEvent::ListeningDisabled("Speech Recognition not supported.".to_string())
    );

    // Failures never reach the speech output
    assert!(harness.spoken.lock().is_empty());

    harness.shutdown();
}
