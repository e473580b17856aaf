//! Declarative side effects produced by handlers
//!
//! Handlers never touch devices. They return an [`Outcome`] describing what
//! to say, what to show and which effects the host should perform, in order.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideEffect {
    /// Load and start a track
    PlayAudio { locator: String },
    PauseAudio,
    ResumeAudio,
    /// Halt and rewind the current track
    StopAudio,
    SetVolume { volume: f32 },
    /// Open a URL in a new browser tab/window
    OpenUrl { url: String },
    /// Show the weather condition icon
    SetIcon { url: String },
    /// Show the countdown display with the given remaining time
    ShowTimer { remaining: u64 },
    HideTimer,
    /// Begin delivering one-second ticks for the countdown
    StartTicker,
    /// Stop delivering countdown ticks
    CancelTicker,
    /// Alert sound on timer expiry
    PlayBeep,
    /// Show the camera feed
    ShowCamera,
    HideCamera,
}

/// Result of handling one command or timer tick
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    /// Text to speak; empty means stay silent
    pub response: String,
    /// Text to display when it differs from the spoken response
    pub display: Option<String>,
    pub effects: Vec<SideEffect>,
}

impl Outcome {
    pub fn say(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            display: None,
            effects: Vec::new(),
        }
    }

    /// An outcome with nothing to say and no effects
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Text for the output panel
    pub fn display_text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.response)
    }

    pub fn is_silent(&self) -> bool {
        self.response.is_empty()
    }
}
