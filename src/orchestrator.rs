//! Orchestrator for the command-handling session
//!
//! All mutation happens on one worker thread. It serializes:
//! - Utterances from the speech listener or the host
//! - Countdown ticks from the clock
//! - Playback notifications (track ended)
//! - Settings edits
//!
//! Side effects returned by the dispatcher are carried out against the
//! playback and speech collaborators, then forwarded to the host as
//! `AssistantEvent`s. Session state can be read at any time through
//! `SharedSession`.

use crate::capabilities::{AudioPlayback, SpeechInput, SpeechInputError, SpeechOutput};
use crate::effects::{Outcome, SideEffect};
use crate::handlers::Dispatcher;
use crate::session::SharedSession;
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Requests accepted by the orchestrator
#[derive(Clone, Debug)]
pub enum AssistantCommand {
    /// A recognized utterance to classify and handle
    Utterance(String),
    /// The listener failed to recognize anything
    ListenFailed(SpeechInputError),
    /// Playback finished the current track
    TrackEnded,
    /// Send the current shortcuts back as `AssistantEvent::Settings`
    RequestSettings,
    /// Merge edited shortcuts (name, url)
    SaveSettings(Vec<(String, String)>),
    /// Tear down the session and stop the worker
    Shutdown,
}

/// Notifications for the host
#[derive(Clone, Debug, PartialEq)]
pub enum AssistantEvent {
    /// The command as understood, before handling
    Heard(String),
    /// Reply to speak and text to display
    Response { speech: String, display: String },
    /// A side effect the host should render (URL, icon, timer, camera, ...)
    Effect(SideEffect),
    /// Current shortcuts for the settings screen
    Settings(Vec<(String, String)>),
    /// Recognition failed; listening may be retried
    ListeningError(String),
    /// Voice input is unavailable on this host
    ListeningDisabled(String),
    /// Shutdown complete
    Shutdown,
}

/// Output collaborators driven by the worker
pub struct Outputs {
    pub speech: Box<dyn SpeechOutput>,
    pub playback: Box<dyn AudioPlayback>,
}

/// Handle for controlling the orchestrator from the host or tests
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: Sender<AssistantCommand>,
    event_rx: Receiver<AssistantEvent>,
    session: SharedSession,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: AssistantCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| ParleyError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Handle a recognized utterance
    pub fn utterance(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(AssistantCommand::Utterance(text.into()))
    }

    /// Report that the current track finished
    pub fn track_ended(&self) -> Result<()> {
        self.send_command(AssistantCommand::TrackEnded)
    }

    pub fn request_settings(&self) -> Result<()> {
        self.send_command(AssistantCommand::RequestSettings)
    }

    pub fn save_settings(&self, entries: Vec<(String, String)>) -> Result<()> {
        self.send_command(AssistantCommand::SaveSettings(entries))
    }

    /// Request shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AssistantCommand::Shutdown)
    }

    /// Sender usable by a listener thread
    pub fn command_sender(&self) -> Sender<AssistantCommand> {
        self.command_tx.clone()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<AssistantEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> Result<AssistantEvent> {
        self.event_rx
            .recv()
            .map_err(|e| ParleyError::ChannelError(format!("Failed to receive event: {}", e)))
    }

    /// Receive an event, giving up after `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Result<AssistantEvent> {
        self.event_rx
            .recv_timeout(timeout)
            .map_err(|e| ParleyError::ChannelError(format!("Failed to receive event: {}", e)))
    }

    /// Shared session state (read-only use)
    pub fn session(&self) -> &SharedSession {
        &self.session
    }
}

/// Owns the dispatcher and output collaborators on the worker thread
pub struct Orchestrator {
    dispatcher: Dispatcher,
    outputs: Outputs,
    command_rx: Receiver<AssistantCommand>,
    event_tx: Sender<AssistantEvent>,
    tick_interval: Duration,
}

impl Orchestrator {
    /// Create a new orchestrator around a dispatcher
    ///
    /// Returns the orchestrator and a handle for controlling it. Channel
    /// sizes and the tick period come from the dispatcher's configuration.
    pub fn new(dispatcher: Dispatcher, outputs: Outputs) -> (Self, OrchestratorHandle) {
        let buffer_size = dispatcher.config().channel_buffer_size;
        let tick_interval = dispatcher.config().tick_interval();

        let (command_tx, command_rx) = bounded(buffer_size);
        let (event_tx, event_rx) = bounded(buffer_size);

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            session: dispatcher.session(),
        };

        let orchestrator = Self {
            dispatcher,
            outputs,
            command_rx,
            event_tx,
            tick_interval,
        };

        (orchestrator, handle)
    }

    /// Start the worker thread
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(mut self) {
        info!("Orchestrator main loop starting");

        let command_rx = self.command_rx.clone();

        // Live only while a countdown runs; replaced on every new timer
        let mut ticker: Option<Receiver<Instant>> = None;

        loop {
            let tick_rx = ticker.clone().unwrap_or_else(never);

            select! {
                recv(command_rx) -> cmd => {
                    match cmd {
                        Ok(AssistantCommand::Utterance(text)) => {
                            let command = crate::intent::normalize(&text);
                            self.emit(AssistantEvent::Heard(command.clone()));
                            let outcome = self.dispatcher.handle(&command);
                            self.deliver(outcome, &mut ticker);
                        }

                        Ok(AssistantCommand::ListenFailed(err)) => {
                            self.listen_failed(err);
                        }

                        Ok(AssistantCommand::TrackEnded) => {
                            let outcome = self.dispatcher.track_ended();
                            self.deliver(outcome, &mut ticker);
                        }

                        Ok(AssistantCommand::RequestSettings) => {
                            let entries = self
                                .dispatcher
                                .shortcuts()
                                .entries()
                                .map(|(name, url)| (name.to_string(), url.to_string()))
                                .collect();
                            self.emit(AssistantEvent::Settings(entries));
                        }

                        Ok(AssistantCommand::SaveSettings(entries)) => {
                            let outcome = self.dispatcher.save_settings(entries);
                            self.deliver(outcome, &mut ticker);
                        }

                        Ok(AssistantCommand::Shutdown) => {
                            info!("Shutdown requested");
                            let outcome = self.dispatcher.shutdown();
                            self.deliver(outcome, &mut ticker);
                            self.emit(AssistantEvent::Shutdown);
                            info!("Orchestrator shutdown complete");
                            return;
                        }

                        Err(_) => {
                            warn!("Command channel disconnected");
                            self.dispatcher.shutdown();
                            break;
                        }
                    }
                }

                recv(tick_rx) -> tick => {
                    match tick {
                        Ok(_) => {
                            let outcome = self.dispatcher.tick();
                            self.deliver(outcome, &mut ticker);
                        }
                        Err(_) => {
                            debug!("Ticker disconnected");
                            ticker = None;
                        }
                    }
                }
            }
        }

        info!("Orchestrator main loop exiting");
    }

    /// Carry out an outcome's effects, then speak and report it
    fn deliver(&mut self, outcome: Outcome, ticker: &mut Option<Receiver<Instant>>) {
        for effect in &outcome.effects {
            match effect {
                SideEffect::StartTicker => {
                    *ticker = Some(self.dispatcher.clock().ticker(self.tick_interval));
                }
                SideEffect::CancelTicker => *ticker = None,
                SideEffect::PlayAudio { locator } => self.outputs.playback.play(locator),
                SideEffect::PauseAudio => self.outputs.playback.pause(),
                SideEffect::ResumeAudio => self.outputs.playback.resume(),
                SideEffect::StopAudio => self.outputs.playback.stop(),
                SideEffect::SetVolume { volume } => self.outputs.playback.set_volume(*volume),
                _ => {}
            }
            self.emit(AssistantEvent::Effect(effect.clone()));
        }

        if outcome.is_silent() {
            return;
        }

        if let Err(e) = self.outputs.speech.speak(&outcome.response) {
            warn!("Speech error: {}", e);
        }
        self.emit(AssistantEvent::Response {
            display: outcome.display_text().to_string(),
            speech: outcome.response,
        });
    }

    fn listen_failed(&mut self, err: SpeechInputError) {
        match err {
            SpeechInputError::Unsupported => {
                error!("SpeechRecognition unavailable");
                self.emit(AssistantEvent::ListeningDisabled(
                    "Speech Recognition not supported.".to_string(),
                ));
            }
            other => {
                warn!("Recognition error: {}", other);
                self.emit(AssistantEvent::ListeningError(format!("Error: {}", other)));
            }
        }
    }

    fn emit(&self, event: AssistantEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!("Event channel full, dropping {:?}", event),
            Err(TrySendError::Disconnected(_)) => debug!("Event receiver gone"),
        }
    }
}

/// Feed utterances from a speech input into the orchestrator
///
/// Runs until the input closes, voice input turns out to be unsupported, or
/// the orchestrator stops accepting commands.
pub fn spawn_listener(
    mut input: Box<dyn SpeechInput>,
    commands: Sender<AssistantCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("Listener starting");
        loop {
            let command = match input.listen() {
                Ok(text) => AssistantCommand::Utterance(text),
                Err(SpeechInputError::Closed) => {
                    info!("Speech input closed");
                    break;
                }
                Err(err) => {
                    let fatal = err == SpeechInputError::Unsupported;
                    if commands.send(AssistantCommand::ListenFailed(err)).is_err() || fatal {
                        break;
                    }
                    continue;
                }
            };

            if commands.send(command).is_err() {
                debug!("Orchestrator gone, listener stopping");
                break;
            }
        }
        info!("Listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    struct ScriptedInput(Vec<std::result::Result<String, SpeechInputError>>);

    impl SpeechInput for ScriptedInput {
        fn listen(&mut self) -> std::result::Result<String, SpeechInputError> {
            if self.0.is_empty() {
                Err(SpeechInputError::Closed)
            } else {
                self.0.remove(0)
            }
        }
    }

    #[test]
    fn test_listener_forwards_until_closed() {
        let (tx, rx) = unbounded();
        let input = ScriptedInput(vec![
            Ok("next track".to_string()),
            Err(SpeechInputError::NoSpeech),
            Ok("stop music".to_string()),
        ]);

        spawn_listener(Box::new(input), tx).join().unwrap();

        let received: Vec<AssistantCommand> = rx.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(&received[0], AssistantCommand::Utterance(t) if t == "next track"));
        assert!(matches!(
            &received[1],
            AssistantCommand::ListenFailed(SpeechInputError::NoSpeech)
        ));
    }

    #[test]
    fn test_listener_stops_when_unsupported() {
        let (tx, rx) = unbounded();
        let input = ScriptedInput(vec![
            Err(SpeechInputError::Unsupported),
            Ok("never heard".to_string()),
        ]);

        spawn_listener(Box::new(input), tx).join().unwrap();

        let received: Vec<AssistantCommand> = rx.try_iter().collect();
        assert_eq!(received.len(), 1);
    }
}
