//! Parley - voice-command assistant core
//!
//! Spoken requests are classified against a fixed, ordered set of intents and
//! dispatched to handlers that mutate session state, persist app shortcuts and
//! describe side effects for the host to perform.

pub mod capabilities;
pub mod config;
pub mod effects;
pub mod handlers;
pub mod intent;
pub mod orchestrator;
pub mod playlist;
pub mod session;
pub mod store;

pub use config::AssistantConfig;
pub use effects::{Outcome, SideEffect};
pub use handlers::{CommandError, Dispatcher};
pub use intent::{classify, normalize, Intent};
pub use orchestrator::{
    spawn_listener, AssistantCommand, AssistantEvent, Orchestrator, OrchestratorHandle, Outputs,
};
pub use session::{SessionState, SharedSession};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Orchestrator error: {0}")]
    OrchestratorError(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(e: serde_json::Error) -> Self {
        ParleyError::SerializationError(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A failed write leaves the in-memory shortcuts intact
            ParleyError::StoreError(_) => true,
            ParleyError::SerializationError(_) => true,
            ParleyError::ConfigError(_) => false,
            ParleyError::ChannelError(_) => false,
            ParleyError::IOError(_) => false,
            ParleyError::OrchestratorError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::StoreError(_) => "Could not save your app shortcuts.".to_string(),
            ParleyError::SerializationError(_) => {
                "Stored app shortcuts could not be read.".to_string()
            }
            ParleyError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
            ParleyError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            ParleyError::IOError(_) => "File system error occurred.".to_string(),
            ParleyError::OrchestratorError(_) => "System error occurred. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;
