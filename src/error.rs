// Typed errors for the playlist core
// Everything here is recoverable - the router turns each one into a reply

use thiserror::Error;

/// Failures from the playlist store. None of them leave the store half-mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error("playlist '{0}' already exists")]
    AlreadyExists(String),

    #[error("playlist '{0}' not found")]
    NotFound(String),

    /// `position` is the 1-based position the caller asked for
    #[error("track {position} is out of range for '{name}' ({len} tracks)")]
    IndexOutOfRange {
        name: String,
        position: usize,
        len: usize,
    },

    #[error("'{name}' can't be used as a playlist name: {reason}")]
    InvalidName { name: String, reason: NameRejection },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    Empty,
    TooLong { max: usize },
    Reserved,
}

impl std::fmt::Display for NameRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameRejection::Empty => write!(f, "name is empty"),
            NameRejection::TooLong { max } => write!(f, "longer than {} characters", max),
            NameRejection::Reserved => write!(f, "clashes with a bot command"),
        }
    }
}

/// Text command parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Carries the usage line for the command the user was attempting
    #[error("malformed command, usage: {usage}")]
    MalformedCommand { usage: &'static str },
}
