use crate::types::{TrackRef, UserId};

/// Everything the transport can hand us
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(UserId),
    TextInput(UserId, String),
    MediaInput(UserId, TrackRef),
    ButtonAction(UserId, Button),
}

impl Event {
    pub fn user(&self) -> UserId {
        match self {
            Event::Start(user)
            | Event::TextInput(user, _)
            | Event::MediaInput(user, _)
            | Event::ButtonAction(user, _) => *user,
        }
    }
}

/// Button presses, each carrying whatever it acts on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Button {
    CreatePlaylist,
    ListPlaylists,
    OpenPlaylist(String),
    OpenSettings,
    DeletePlaylist(String),
    RenamePlaylist(String),
    RemoveTrackMenu(String),
    /// 1-based position, as shown to the user
    RemoveTrackAt(String, usize),
}
