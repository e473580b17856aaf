//! Session-scoped state for the assistant
//!
//! This module provides the state mutated by command handlers:
//! - **Playback**: current playlist, track position and player status
//! - **Volume**: kept in tenths so it can only move in 0.1 steps
//! - **Countdown**: the single timer (Idle → Running → Expired/Cancelled → Idle)
//! - **Camera**: handle of the open camera stream, if any
//!
//! `SharedSession` wraps the state for reading from the host while the
//! orchestrator thread owns all writes.

use crate::capabilities::CameraHandle;
use crate::playlist::DEFAULT_PLAYLIST;
use parking_lot::RwLock;
use std::sync::Arc;

/// Player status as the handlers see it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing has been loaded yet
    #[default]
    Idle,
    Playing,
    Paused,
    /// Loaded track rewound and halted
    Stopped,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    /// Whether a track is loaded and could be resumed
    pub fn is_resumable(&self) -> bool {
        matches!(self, PlaybackState::Paused | PlaybackState::Stopped)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Playback volume in tenths, always within 0..=10
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: Volume = Volume(10);
    pub const MIN: Volume = Volume(0);

    /// Nearest tenth to `fraction`, clamped to [0.0, 1.0]
    pub fn from_fraction(fraction: f32) -> Self {
        let tenths = (fraction.clamp(0.0, 1.0) * 10.0).round() as u8;
        Volume(tenths.min(10))
    }

    pub fn fraction(&self) -> f32 {
        f32::from(self.0) / 10.0
    }

    pub fn percent(&self) -> u8 {
        self.0 * 10
    }

    /// Raise by one step; false when already at maximum
    pub fn step_up(&mut self) -> bool {
        if *self >= Self::MAX {
            return false;
        }
        self.0 += 1;
        true
    }

    /// Lower by one step; false when already at minimum
    pub fn step_down(&mut self) -> bool {
        if *self <= Self::MIN {
            return false;
        }
        self.0 -= 1;
        true
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume(5)
    }
}

/// Countdown timer phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerPhase {
    #[default]
    Idle,
    Running { remaining: u64 },
}

/// Observable result of a countdown tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed, timer still running
    Tick { remaining: u64 },
    /// Reached zero; the timer is idle again
    Expired,
}

/// The single session timer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    phase: TimerPhase,
}

impl Countdown {
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, TimerPhase::Running { .. })
    }

    pub fn remaining(&self) -> Option<u64> {
        match self.phase {
            TimerPhase::Running { remaining } => Some(remaining),
            TimerPhase::Idle => None,
        }
    }

    /// Start counting down from `seconds`
    ///
    /// Returns true when a running countdown was cancelled to make room.
    pub fn start(&mut self, seconds: u64) -> bool {
        let superseded = self.is_active();
        self.phase = TimerPhase::Running { remaining: seconds };
        superseded
    }

    /// Cancel a running countdown; false when idle
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.phase = TimerPhase::Idle;
        was_active
    }

    /// Advance one second
    ///
    /// Ticks that arrive while idle are ignored and return `None`.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let TimerPhase::Running { remaining } = self.phase else {
            return None;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.phase = TimerPhase::Idle;
            Some(TimerEvent::Expired)
        } else {
            self.phase = TimerPhase::Running { remaining };
            Some(TimerEvent::Tick { remaining })
        }
    }
}

/// Format seconds as `mm:ss`
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// All mutable state owned by one running session
#[derive(Clone, Debug)]
pub struct SessionState {
    /// Name of the playlist track navigation refers to
    pub playlist: String,
    /// Index into the current playlist's tracks
    pub track_index: usize,
    pub playback: PlaybackState,
    pub volume: Volume,
    pub timer: Countdown,
    pub camera: Option<CameraHandle>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            playlist: DEFAULT_PLAYLIST.to_string(),
            track_index: 0,
            playback: PlaybackState::Idle,
            volume: Volume::default(),
            timer: Countdown::default(),
            camera: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state with the given starting volume
    pub fn with_volume(volume: f32) -> Self {
        Self {
            volume: Volume::from_fraction(volume),
            ..Self::default()
        }
    }

    pub fn timer_active(&self) -> bool {
        self.timer.is_active()
    }

    pub fn timer_remaining_seconds(&self) -> Option<u64> {
        self.timer.remaining()
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }
}

/// Thread-safe shared session state
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<SessionState>>,
}

impl SharedSession {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, SessionState> {
        self.inner.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, SessionState> {
        self.inner.write()
    }

    /// Copy of current state (no lock held after return)
    pub fn snapshot(&self) -> SessionState {
        self.inner.read().clone()
    }

    pub fn volume(&self) -> f32 {
        self.inner.read().volume.fraction()
    }

    pub fn timer_active(&self) -> bool {
        self.inner.read().timer_active()
    }

    pub fn timer_remaining_seconds(&self) -> Option<u64> {
        self.inner.read().timer_remaining_seconds()
    }

    pub fn camera_active(&self) -> bool {
        self.inner.read().camera_active()
    }

    pub fn playback(&self) -> PlaybackState {
        self.inner.read().playback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_steps_and_clamps() {
        let mut volume = Volume::from_fraction(0.5);
        for _ in 0..5 {
            assert!(volume.step_up());
        }
        assert_eq!(volume, Volume::MAX);
        assert_eq!(volume.fraction(), 1.0);
        assert!(!volume.step_up());
        assert_eq!(volume.percent(), 100);

        let mut volume = Volume::from_fraction(0.1);
        assert!(volume.step_down());
        assert!(!volume.step_down());
        assert_eq!(volume.fraction(), 0.0);
    }

    #[test]
    fn test_volume_from_fraction_rounds() {
        assert_eq!(Volume::from_fraction(0.44).percent(), 40);
        assert_eq!(Volume::from_fraction(0.46).percent(), 50);
        assert_eq!(Volume::from_fraction(3.0), Volume::MAX);
        assert_eq!(Volume::from_fraction(-1.0), Volume::MIN);
    }

    #[test]
    fn test_countdown_runs_to_expiry() {
        let mut timer = Countdown::default();
        assert_eq!(timer.tick(), None);

        assert!(!timer.start(3));
        assert_eq!(timer.remaining(), Some(3));
        assert_eq!(timer.tick(), Some(TimerEvent::Tick { remaining: 2 }));
        assert_eq!(timer.tick(), Some(TimerEvent::Tick { remaining: 1 }));
        assert_eq!(timer.tick(), Some(TimerEvent::Expired));
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn test_countdown_restart_supersedes() {
        let mut timer = Countdown::default();
        timer.start(60);
        timer.tick();

        assert!(timer.start(120));
        assert_eq!(timer.remaining(), Some(120));
    }

    #[test]
    fn test_countdown_cancel() {
        let mut timer = Countdown::default();
        assert!(!timer.cancel());

        timer.start(10);
        assert!(timer.cancel());
        assert!(!timer.is_active());
        assert!(!timer.cancel());
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(120), "02:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(3725), "62:05");
    }

    #[test]
    fn test_session_defaults() {
        let state = SessionState::with_volume(0.5);
        assert_eq!(state.playlist, "default");
        assert_eq!(state.track_index, 0);
        assert_eq!(state.playback, PlaybackState::Idle);
        assert_eq!(state.volume.fraction(), 0.5);
        assert!(!state.timer_active());
        assert!(!state.camera_active());
    }

    #[test]
    fn test_shared_session_snapshot_is_independent() {
        let shared = SharedSession::new(SessionState::new());
        let before = shared.snapshot();

        shared.write().timer.start(30);

        assert!(!before.timer_active());
        assert!(shared.timer_active());
        assert_eq!(shared.timer_remaining_seconds(), Some(30));
    }

    #[test]
    fn test_playback_state() {
        assert!(PlaybackState::Playing.is_playing());
        assert!(PlaybackState::Paused.is_resumable());
        assert!(PlaybackState::Stopped.is_resumable());
        assert!(!PlaybackState::Idle.is_resumable());
        assert_eq!(PlaybackState::Paused.to_string(), "Paused");
    }
}
