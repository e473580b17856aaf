//! Command handlers and the dispatcher that routes intents to them
//!
//! Each handler family lives in its own module and returns
//! `Result<Outcome, CommandError>`. The [`Dispatcher`] owns the session, the
//! shortcut store and the capability collaborators, and recovers every
//! `CommandError` into a spoken reply so nothing escapes to the caller.

pub mod apps;
pub mod camera;
pub mod info;
pub mod music;
pub mod timer;

use crate::capabilities::{CameraDevice, Clock, NetworkFetch};
use crate::config::AssistantConfig;
use crate::effects::{Outcome, SideEffect};
use crate::intent::{classify, normalize, Intent};
use crate::playlist::{PlaylistCatalog, DEFAULT_PLAYLIST};
use crate::session::{SessionState, SharedSession, Volume};
use crate::store::ShortcutStore;
use thiserror::Error;
use tracing::{debug, error, info};

/// Handler-level failures, each carrying the reply the user hears
///
/// None of these change session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A required slot (city, minutes, app name) was left out
    #[error("{0}")]
    MissingArgument(String),

    /// Unknown app or playlist
    #[error("{0}")]
    NotFound(String),

    /// Malformed argument such as a URL without a scheme
    #[error("{0}")]
    InvalidInput(String),

    /// A network, speech or device collaborator failed
    #[error("{reply}")]
    ExternalFailure { reply: String, detail: String },

    /// Credentials or environment prerequisites are missing
    #[error("{0}")]
    Unconfigured(String),
}

impl CommandError {
    pub fn missing(reply: impl Into<String>) -> Self {
        CommandError::MissingArgument(reply.into())
    }

    pub fn not_found(reply: impl Into<String>) -> Self {
        CommandError::NotFound(reply.into())
    }

    pub fn external(reply: impl Into<String>, detail: impl ToString) -> Self {
        CommandError::ExternalFailure {
            reply: reply.into(),
            detail: detail.to_string(),
        }
    }

    /// The text spoken back to the user
    pub fn reply(&self) -> String {
        self.to_string()
    }
}

pub type HandlerResult = std::result::Result<Outcome, CommandError>;

/// Collaborators the handlers call synchronously
pub struct Services {
    pub network: Box<dyn NetworkFetch>,
    pub camera: Box<dyn CameraDevice>,
    pub clock: Box<dyn Clock>,
}

/// Routes classified commands to handlers against one session
///
/// Not re-entrant: callers serialize `handle`, `tick` and `track_ended`
/// (the orchestrator does this on its worker thread).
pub struct Dispatcher {
    config: AssistantConfig,
    session: SharedSession,
    shortcuts: ShortcutStore,
    catalog: PlaylistCatalog,
    services: Services,
}

impl Dispatcher {
    pub fn new(config: AssistantConfig, shortcuts: ShortcutStore, services: Services) -> Self {
        let session = SharedSession::new(SessionState::with_volume(config.default_volume));
        Self {
            config,
            session,
            shortcuts,
            catalog: PlaylistCatalog::default(),
            services,
        }
    }

    /// Shared view of the session for readers on other threads
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn shortcuts(&self) -> &ShortcutStore {
        &self.shortcuts
    }

    pub fn clock(&self) -> &dyn Clock {
        self.services.clock.as_ref()
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Classify and execute one utterance
    pub fn handle(&mut self, raw: &str) -> Outcome {
        let command = normalize(raw);
        let intent = classify(&command);
        info!("Command '{}' classified as {:?}", command, intent.kind());

        let outcome = recover(self.execute(intent));
        debug!("Response: '{}', effects: {:?}", outcome.response, outcome.effects);
        outcome
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> Outcome {
        timer::tick(&mut self.session.write())
    }

    /// The current track finished playing
    pub fn track_ended(&mut self) -> Outcome {
        music::track_ended(&mut self.session.write(), &self.catalog)
    }

    /// Merge edited shortcuts from the settings screen
    pub fn save_settings(&mut self, entries: Vec<(String, String)>) -> Outcome {
        apps::save_settings(&mut self.shortcuts, entries)
    }

    /// Tear the session down: cancel the timer and release the camera
    pub fn shutdown(&mut self) -> Outcome {
        let mut session = self.session.write();
        let mut outcome = Outcome::silent();

        if session.timer.cancel() {
            outcome = outcome
                .with_effect(SideEffect::CancelTicker)
                .with_effect(SideEffect::HideTimer);
        }
        if let Some(handle) = session.camera.take() {
            self.services.camera.close(handle);
            outcome = outcome.with_effect(SideEffect::HideCamera);
        }

        info!("Session torn down");
        outcome
    }

    fn default_volume(&self) -> Volume {
        Volume::from_fraction(self.config.default_volume)
    }

    fn execute(&mut self, intent: Intent) -> HandlerResult {
        match intent {
            Intent::TimeQuery => Ok(info::time(self.services.clock.now())),
            Intent::JokeQuery => Ok(info::joke()),
            Intent::NameQuery => Ok(info::name()),
            Intent::WeatherQuery { city } => info::weather(
                self.services.network.as_ref(),
                self.config.weather_key(),
                &city,
            ),
            Intent::NewsQuery => info::news(self.services.network.as_ref(), self.config.news_key()),

            Intent::TimerSet { minutes } => timer::set(&mut self.session.write(), minutes),
            Intent::TimerStop => Ok(timer::stop(&mut self.session.write())),

            Intent::AppOpen { app, search } => apps::open(&self.shortcuts, &app, search.as_deref()),
            Intent::AppAdd { name, url } => apps::add(&mut self.shortcuts, &name, &url),
            Intent::AppRemove { name } => apps::remove(&mut self.shortcuts, &name),

            Intent::PlaylistPlay { name } => {
                let volume = self.default_volume();
                music::play_playlist(&mut self.session.write(), &self.catalog, &name, volume)
            }
            Intent::PlayMusic => {
                let volume = self.default_volume();
                music::play_playlist(
                    &mut self.session.write(),
                    &self.catalog,
                    DEFAULT_PLAYLIST,
                    volume,
                )
            }
            Intent::PauseMusic => Ok(music::pause(&mut self.session.write())),
            Intent::ResumeMusic => Ok(music::resume(&mut self.session.write())),
            Intent::StopMusic => Ok(music::stop(&mut self.session.write())),
            Intent::NextTrack => Ok(music::next_track(&mut self.session.write(), &self.catalog)),
            Intent::PrevTrack => Ok(music::previous_track(&mut self.session.write(), &self.catalog)),
            Intent::VolumeUp => Ok(music::volume_up(&mut self.session.write())),
            Intent::VolumeDown => Ok(music::volume_down(&mut self.session.write())),

            Intent::CameraOpen => camera::open(
                &mut self.session.write(),
                self.services.camera.as_mut(),
                self.config.secure_context,
            ),
            Intent::CameraClose => Ok(camera::close(
                &mut self.session.write(),
                self.services.camera.as_mut(),
            )),

            Intent::Fallback => Ok(info::help()),
        }
    }
}

/// Turn a handler error into the reply the user hears
fn recover(result: HandlerResult) -> Outcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            match &err {
                CommandError::ExternalFailure { detail, .. } => {
                    error!("Command failed: {}", detail);
                }
                other => debug!("Command rejected: {:?}", other),
            }
            Outcome::say(err.reply())
        }
    }
}
