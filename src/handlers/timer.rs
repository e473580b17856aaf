//! Countdown timer handlers
//!
//! Handlers only install or remove the countdown. The orchestrator drives it
//! by calling [`tick`] once per tick period while a ticker is running.

use super::{CommandError, HandlerResult};
use crate::effects::{Outcome, SideEffect};
use crate::session::{SessionState, TimerEvent};
use tracing::{debug, info};

pub const TIMER_TOO_LONG: &str = "That timer is too long. Please choose fewer minutes.";

pub fn set(state: &mut SessionState, minutes: Option<u64>) -> HandlerResult {
    let minutes = minutes.ok_or_else(|| CommandError::missing("Please specify a number of minutes."))?;
    let seconds = minutes
        .checked_mul(60)
        .ok_or_else(|| CommandError::InvalidInput(TIMER_TOO_LONG.to_string()))?;

    let mut outcome = Outcome::say(format!(
        "Timer set for {} minute{}.",
        minutes,
        if minutes > 1 { "s" } else { "" }
    ));

    if state.timer.start(seconds) {
        info!("Previous timer cancelled by a new one");
        outcome = outcome.with_effect(SideEffect::CancelTicker);
    }
    info!("Timer started for {} seconds", seconds);

    Ok(outcome
        .with_effect(SideEffect::ShowTimer { remaining: seconds })
        .with_effect(SideEffect::StartTicker))
}

pub fn stop(state: &mut SessionState) -> Outcome {
    if !state.timer.cancel() {
        return Outcome::say("No active timer to stop.");
    }
    info!("Timer stopped");
    Outcome::say("Timer stopped.")
        .with_effect(SideEffect::CancelTicker)
        .with_effect(SideEffect::HideTimer)
}

/// One second of countdown
///
/// Updates the display while running and raises the alert at zero. A tick
/// with no running timer asks for the ticker to be cancelled.
pub fn tick(state: &mut SessionState) -> Outcome {
    match state.timer.tick() {
        Some(TimerEvent::Tick { remaining }) => {
            Outcome::silent().with_effect(SideEffect::ShowTimer { remaining })
        }
        Some(TimerEvent::Expired) => {
            info!("Timer expired");
            Outcome::say("Time's up!")
                .with_display("Timer finished!")
                .with_effect(SideEffect::CancelTicker)
                .with_effect(SideEffect::PlayBeep)
                .with_effect(SideEffect::HideTimer)
        }
        None => {
            debug!("Stale tick with no running timer");
            Outcome::silent().with_effect(SideEffect::CancelTicker)
        }
    }
}
