use tracing::info;

use crate::error::PlaylistError;
use crate::types::TrackRef;

/// A single named playlist with its tracks in the order they were added
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub name: String,
    tracks: Vec<TrackRef>,
}

impl Playlist {
    /// Create a new empty playlist
    pub fn new(name: String) -> Self {
        Self {
            name,
            tracks: Vec::new(),
        }
    }

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if playlist is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Append a track to the end. Duplicates are allowed - the same file can
    /// be sent twice on purpose.
    pub fn push_track(&mut self, track: TrackRef) -> usize {
        info!("Added track '{}' to playlist '{}'", track, self.name);
        self.tracks.push(track);
        self.tracks.len()
    }

    /// Remove the track at a 1-based `position`.
    ///
    /// Everything after it moves up by one, so positions taken before the
    /// call no longer point at the same tracks.
    pub fn remove_track_at(&mut self, position: usize) -> Result<TrackRef, PlaylistError> {
        if position == 0 || position > self.tracks.len() {
            return Err(PlaylistError::IndexOutOfRange {
                name: self.name.clone(),
                position,
                len: self.tracks.len(),
            });
        }

        let track = self.tracks.remove(position - 1);
        info!("Removed track {} ('{}') from playlist '{}'", position, track, self.name);
        Ok(track)
    }

    pub(super) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
