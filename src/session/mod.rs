// Per-user conversation state - what the next message from each user means
// Sessions appear on first contact and get swept once they go idle

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::types::{MessageId, UserId};

/// What a user is in the middle of
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Idle,
    AwaitingPlaylistName,
    AwaitingRenameTarget { old: String },
    ActivePlaylist { name: String },
}

impl State {
    /// The playlist this state points at, if any
    pub fn playlist(&self) -> Option<&str> {
        match self {
            State::AwaitingRenameTarget { old } => Some(old.as_str()),
            State::ActivePlaylist { name } => Some(name.as_str()),
            State::Idle | State::AwaitingPlaylistName => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            State::AwaitingPlaylistName | State::AwaitingRenameTarget { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub state: State,
    /// Messages shown by the last "open playlist", retracted before the next one
    pub sent_batch: Vec<MessageId>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: State::Idle,
            sent_batch: Vec::new(),
            last_seen: Utc::now(),
        }
    }
}

/// Owns every user's session. Users never see each other's entries.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `Idle` for users we haven't seen yet
    pub async fn state(&self, user: UserId) -> State {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(user).or_insert_with(Session::new);
        session.last_seen = Utc::now();
        session.state.clone()
    }

    pub async fn set_state(&self, user: UserId, state: State) {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(user).or_insert_with(Session::new);
        debug!("User {} state {:?} -> {:?}", user, session.state, state);
        session.state = state;
        session.last_seen = Utc::now();
    }

    /// Replace the user's sent batch wholesale
    pub async fn record_sent_batch(&self, user: UserId, ids: Vec<MessageId>) {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(user).or_insert_with(Session::new);
        session.sent_batch = ids;
        session.last_seen = Utc::now();
    }

    /// Hand back the previous batch and leave an empty one behind
    pub async fn take_sent_batch(&self, user: UserId) -> Vec<MessageId> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .get_mut(&user)
            .map(|session| std::mem::take(&mut session.sent_batch))
            .unwrap_or_default()
    }

    /// Reset everyone pointing at a deleted playlist back to `Idle`
    pub async fn invalidate_playlist(&self, name: &str) -> usize {
        let mut sessions = self.sessions.lock().await;
        let mut reset = 0;
        for session in sessions.values_mut() {
            if session.state.playlist() == Some(name) {
                session.state = State::Idle;
                reset += 1;
            }
        }
        if reset > 0 {
            info!("Reset {} session(s) after playlist '{}' went away", reset, name);
        }
        reset
    }

    /// Follow a rename: anyone active on (or about to rename) `old` now points at `new`
    pub async fn retarget_playlist(&self, old: &str, new: &str) -> usize {
        let mut sessions = self.sessions.lock().await;
        let mut moved = 0;
        for session in sessions.values_mut() {
            match &mut session.state {
                State::ActivePlaylist { name } | State::AwaitingRenameTarget { old: name }
                    if *name == old =>
                {
                    *name = new.to_string();
                    moved += 1;
                }
                _ => {}
            }
        }
        moved
    }

    /// Drop sessions that haven't been touched for `max_idle`
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        // a window reaching past the start of time expires nobody
        let Some(cutoff) = Utc::now().checked_sub_signed(max_idle) else {
            return 0;
        };
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen >= cutoff);
        let expired = before - sessions.len();
        if expired > 0 {
            info!("Expired {} idle session(s), {} left", expired, sessions.len());
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
