//! Built-in playlist catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the playlist used when none is given
pub const DEFAULT_PLAYLIST: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub locator: String,
}

impl Track {
    pub fn new(title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index of the last track, `None` for an empty playlist
    pub fn last_index(&self) -> Option<usize> {
        self.tracks.len().checked_sub(1)
    }
}

/// Immutable name → playlist lookup
#[derive(Debug, Clone)]
pub struct PlaylistCatalog {
    playlists: BTreeMap<String, Playlist>,
}

impl PlaylistCatalog {
    /// Build a catalog; empty playlists are dropped so every entry has a track 0
    pub fn new(playlists: impl IntoIterator<Item = Playlist>) -> Self {
        Self {
            playlists: playlists
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Playlist> {
        self.playlists.get(name)
    }
}

impl Default for PlaylistCatalog {
    fn default() -> Self {
        let song = |n: u32| format!("https://www.soundhelix.com/examples/mp3/SoundHelix-Song-{}.mp3", n);

        Self::new([
            Playlist::new(
                DEFAULT_PLAYLIST,
                vec![
                    Track::new("Track 1", song(1)),
                    Track::new("Track 2", song(2)),
                    Track::new("Track 3", song(3)),
                ],
            ),
            Playlist::new(
                "chill",
                vec![Track::new("Chill 1", song(4)), Track::new("Chill 2", song(5))],
            ),
        ])
    }
}
