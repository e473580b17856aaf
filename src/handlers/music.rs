//! Playlist playback, track navigation and volume

use super::{CommandError, HandlerResult};
use crate::effects::{Outcome, SideEffect};
use crate::playlist::PlaylistCatalog;
use crate::session::{PlaybackState, SessionState, Volume};
use tracing::info;

pub const PLAYLIST_NOT_FOUND: &str = "Playlist not found. Try 'default' or 'chill'.";

pub fn play_playlist(
    state: &mut SessionState,
    catalog: &PlaylistCatalog,
    name: &str,
    default_volume: Volume,
) -> HandlerResult {
    let playlist = catalog
        .get(name)
        .ok_or_else(|| CommandError::not_found(PLAYLIST_NOT_FOUND))?;
    let track = playlist
        .track(0)
        .ok_or_else(|| CommandError::not_found(PLAYLIST_NOT_FOUND))?;

    state.playlist = playlist.name.clone();
    state.track_index = 0;
    state.playback = PlaybackState::Playing;
    state.volume = default_volume;
    info!("Playing playlist {} from the start", playlist.name);

    Ok(Outcome::say(format!(
        "Playing {} from {} playlist.",
        track.title, playlist.name
    ))
    .with_effect(SideEffect::PlayAudio {
        locator: track.locator.clone(),
    })
    .with_effect(SideEffect::SetVolume {
        volume: default_volume.fraction(),
    }))
}

pub fn pause(state: &mut SessionState) -> Outcome {
    if !state.playback.is_playing() {
        return Outcome::say("Music is not playing.");
    }
    state.playback = PlaybackState::Paused;
    Outcome::say("Music paused.").with_effect(SideEffect::PauseAudio)
}

pub fn resume(state: &mut SessionState) -> Outcome {
    if !state.playback.is_resumable() {
        return Outcome::say("Music is already playing or not started.");
    }
    state.playback = PlaybackState::Playing;
    Outcome::say("Music resumed.").with_effect(SideEffect::ResumeAudio)
}

pub fn stop(state: &mut SessionState) -> Outcome {
    if !state.playback.is_playing() {
        return Outcome::say("No music is playing.");
    }
    state.playback = PlaybackState::Stopped;
    Outcome::say("Music stopped.").with_effect(SideEffect::StopAudio)
}

pub fn next_track(state: &mut SessionState, catalog: &PlaylistCatalog) -> Outcome {
    let next = catalog
        .get(&state.playlist)
        .and_then(|p| p.track(state.track_index + 1));

    match next {
        Some(track) => {
            state.track_index += 1;
            state.playback = PlaybackState::Playing;
            Outcome::say(format!("Playing next track: {}.", track.title)).with_effect(
                SideEffect::PlayAudio {
                    locator: track.locator.clone(),
                },
            )
        }
        None => Outcome::say("No more tracks in the playlist."),
    }
}

pub fn previous_track(state: &mut SessionState, catalog: &PlaylistCatalog) -> Outcome {
    let previous = state.track_index.checked_sub(1).and_then(|index| {
        catalog
            .get(&state.playlist)
            .and_then(|p| p.track(index))
            .map(|track| (index, track))
    });

    match previous {
        Some((index, track)) => {
            state.track_index = index;
            state.playback = PlaybackState::Playing;
            Outcome::say(format!("Playing previous track: {}.", track.title)).with_effect(
                SideEffect::PlayAudio {
                    locator: track.locator.clone(),
                },
            )
        }
        None => Outcome::say("This is the first track."),
    }
}

/// Playback reached the end of the current track
///
/// Advancing to the next track is silent; only the end of the playlist is
/// announced.
pub fn track_ended(state: &mut SessionState, catalog: &PlaylistCatalog) -> Outcome {
    let has_next = catalog
        .get(&state.playlist)
        .and_then(|p| p.last_index())
        .is_some_and(|last| state.track_index < last);

    if has_next {
        let advanced = next_track(state, catalog);
        return Outcome {
            effects: advanced.effects,
            ..Outcome::silent()
        };
    }

    state.playback = PlaybackState::Stopped;
    info!("Playlist {} finished", state.playlist);
    Outcome::say("Playlist ended.")
}

pub fn volume_up(state: &mut SessionState) -> Outcome {
    if !state.volume.step_up() {
        return Outcome::say("Volume is already at maximum.");
    }
    Outcome::say(format!("Volume increased to {}%.", state.volume.percent())).with_effect(
        SideEffect::SetVolume {
            volume: state.volume.fraction(),
        },
    )
}

pub fn volume_down(state: &mut SessionState) -> Outcome {
    if !state.volume.step_down() {
        return Outcome::say("Volume is already at minimum.");
    }
    Outcome::say(format!("Volume decreased to {}%.", state.volume.percent())).with_effect(
        SideEffect::SetVolume {
            volume: state.volume.fraction(),
        },
    )
}
