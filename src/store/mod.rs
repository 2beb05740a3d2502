// Playlist storage - every playlist the bot knows about, shared by all users
// In-memory only; a restart starts from an empty store

pub mod playlist;

pub use playlist::Playlist;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{NameRejection, PlaylistError};
use crate::types::TrackRef;

pub const DEFAULT_MAX_NAME_LEN: usize = 64;

/// Rules a playlist name has to pass before create/rename
#[derive(Debug, Clone)]
pub struct NamePolicy {
    max_len: usize,
    reserved_words: Vec<String>,
    reserved_labels: Vec<String>,
}

impl NamePolicy {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            reserved_words: Vec::new(),
            reserved_labels: Vec::new(),
        }
    }

    /// Names whose first word is one of `words` would be read back as a command
    pub fn with_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_words
            .extend(words.into_iter().map(|w| w.into().to_lowercase()));
        self
    }

    /// Names equal to a menu label would be read back as a button press
    pub fn with_reserved_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_labels
            .extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self, name: &str) -> Result<(), PlaylistError> {
        let reject = |reason| {
            Err(PlaylistError::InvalidName {
                name: name.to_string(),
                reason,
            })
        };

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return reject(NameRejection::Empty);
        }
        if trimmed.chars().count() > self.max_len {
            return reject(NameRejection::TooLong { max: self.max_len });
        }
        if trimmed.starts_with('/') || self.reserved_labels.iter().any(|l| l == trimmed) {
            return reject(NameRejection::Reserved);
        }
        let first_word = trimmed
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if self.reserved_words.contains(&first_word) {
            return reject(NameRejection::Reserved);
        }

        Ok(())
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NAME_LEN)
    }
}

/// Owns all playlists, keyed by unique name, listed in creation order.
///
/// One lock guards the whole collection, so each call is atomic and two calls
/// touching the same name never interleave. Nothing awaits I/O while holding it.
#[derive(Debug, Default)]
pub struct PlaylistStore {
    playlists: RwLock<Vec<Playlist>>,
    policy: NamePolicy,
}

impl PlaylistStore {
    pub fn new(policy: NamePolicy) -> Self {
        Self {
            playlists: RwLock::new(Vec::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &NamePolicy {
        &self.policy
    }

    /// Create a new empty playlist
    pub async fn create(&self, name: &str) -> Result<(), PlaylistError> {
        self.policy.validate(name)?;

        let mut playlists = self.playlists.write().await;
        if playlists.iter().any(|p| p.name == name) {
            debug!("Refusing duplicate playlist '{}'", name);
            return Err(PlaylistError::AlreadyExists(name.to_string()));
        }

        playlists.push(Playlist::new(name.to_string()));
        info!("Created new playlist: '{}'", name);
        Ok(())
    }

    /// Delete a playlist, returning how many tracks went with it
    pub async fn delete(&self, name: &str) -> Result<usize, PlaylistError> {
        let mut playlists = self.playlists.write().await;
        let pos = position_of(&playlists, name)?;
        let removed = playlists.remove(pos);

        info!("Deleted playlist: '{}' ({} tracks)", removed.name, removed.len());
        Ok(removed.len())
    }

    /// Rename a playlist in place. If `new` is taken nothing changes at all.
    pub async fn rename(&self, old: &str, new: &str) -> Result<(), PlaylistError> {
        let mut playlists = self.playlists.write().await;
        let pos = position_of(&playlists, old)?;
        if old == new {
            return Ok(());
        }
        if playlists.iter().any(|p| p.name == new) {
            return Err(PlaylistError::AlreadyExists(new.to_string()));
        }
        self.policy.validate(new)?;

        playlists[pos].set_name(new.to_string());
        info!("Renamed playlist '{}' to '{}'", old, new);
        Ok(())
    }

    /// Append a track to the end of a playlist, returning the new length
    pub async fn append_track(&self, name: &str, track: TrackRef) -> Result<usize, PlaylistError> {
        let mut playlists = self.playlists.write().await;
        let pos = position_of(&playlists, name)?;
        Ok(playlists[pos].push_track(track))
    }

    /// Remove the track at a 1-based `position`.
    ///
    /// Later tracks shift down by one, so callers holding positions from an
    /// earlier listing must re-read before removing again.
    pub async fn remove_track_at(&self, name: &str, position: usize) -> Result<TrackRef, PlaylistError> {
        let mut playlists = self.playlists.write().await;
        let pos = position_of(&playlists, name)?;
        playlists[pos].remove_track_at(position)
    }

    /// Playlist names in creation order
    pub async fn list(&self) -> Vec<String> {
        self.playlists
            .read()
            .await
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// Snapshot of a playlist's tracks
    pub async fn get(&self, name: &str) -> Result<Vec<TrackRef>, PlaylistError> {
        let playlists = self.playlists.read().await;
        let pos = position_of(&playlists, name)?;
        Ok(playlists[pos].tracks().to_vec())
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.playlists.read().await.iter().any(|p| p.name == name)
    }

    pub async fn len(&self) -> usize {
        self.playlists.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.playlists.read().await.is_empty()
    }
}

fn position_of(playlists: &[Playlist], name: &str) -> Result<usize, PlaylistError> {
    playlists
        .iter()
        .position(|p| p.name == name)
        .ok_or_else(|| PlaylistError::NotFound(name.to_string()))
}
