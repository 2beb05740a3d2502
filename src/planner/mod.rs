// Response planning - turns a routed outcome into messages, and sends them
// Also owns retraction: an open wipes the previous open's messages first

pub mod menu;
pub mod text;

pub use menu::{Menu, MenuEntry, MenuKind};

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::router::Outcome;
use crate::session::SessionRegistry;
use crate::transport::Transport;
use crate::types::{MessageId, TrackRef, UserId};

/// One thing to do at the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SendText {
        user: UserId,
        text: String,
        menu: Option<Menu>,
    },
    SendMedia {
        user: UserId,
        track: TrackRef,
    },
    /// Best effort - a failure here is logged and dropped
    DeleteMessage { user: UserId, message: MessageId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub user: UserId,
    pub actions: Vec<Action>,
    /// The ids of every message sent by this plan become the user's new sent batch
    pub records_batch: bool,
}

impl Plan {
    fn reply(user: UserId, text: impl Into<String>) -> Self {
        Self::with_menu(user, text, None)
    }

    fn with_menu(user: UserId, text: impl Into<String>, menu: Option<Menu>) -> Self {
        Self {
            user,
            actions: vec![Action::SendText {
                user,
                text: text.into(),
                menu,
            }],
            records_batch: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponsePlanner {
    sessions: Arc<SessionRegistry>,
}

impl ResponsePlanner {
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    /// Decide what to send for an outcome. Pure - nothing is sent here.
    pub fn plan(&self, user: UserId, outcome: &Outcome) -> Plan {
        match outcome {
            Outcome::Greeting => Plan::with_menu(user, text::GREETING, Some(menu::main_menu())),
            Outcome::PromptPlaylistName => Plan::reply(user, text::PROMPT_NAME),
            Outcome::PlaylistCreated { name } => Plan::reply(user, text::created(name)),
            Outcome::TrackAdded { playlist, len } => {
                Plan::reply(user, text::track_added(playlist, *len))
            }
            Outcome::NoActivePlaylist => Plan::reply(user, text::NO_ACTIVE_PLAYLIST),
            Outcome::PlaylistList { names } if names.is_empty() => {
                Plan::reply(user, text::NO_PLAYLISTS)
            }
            Outcome::PlaylistList { names } => Plan::with_menu(
                user,
                text::playlist_list(names),
                Some(menu::playlists_menu(names)),
            ),
            Outcome::PlaylistOpened {
                name,
                tracks,
                retract,
            } => self.plan_open(user, name, tracks, retract),
            Outcome::Settings { names } if names.is_empty() => {
                Plan::reply(user, text::NOTHING_TO_SET_UP)
            }
            Outcome::Settings { names } => Plan::with_menu(
                user,
                text::settings(names),
                Some(menu::settings_menu(names)),
            ),
            Outcome::PlaylistDeleted { name } => Plan::reply(user, text::deleted(name)),
            Outcome::PromptRenameTarget { old } => Plan::reply(user, text::prompt_rename(old)),
            Outcome::PlaylistRenamed { old, new } => Plan::reply(user, text::renamed(old, new)),
            Outcome::TrackMenu { name, tracks } if tracks.is_empty() => {
                Plan::reply(user, text::track_menu_empty(name))
            }
            Outcome::TrackMenu { name, tracks } => Plan::with_menu(
                user,
                text::track_menu(name),
                Some(menu::track_removal_menu(name, tracks)),
            ),
            Outcome::TrackRemoved { name, position } => {
                Plan::reply(user, text::track_removed(name, *position))
            }
            Outcome::Failed(err) => Plan::reply(user, text::playlist_error(err)),
            Outcome::Malformed(err) => Plan::reply(user, text::command_error(err)),
            Outcome::Unrecognized => Plan::reply(user, text::UNRECOGNIZED),
        }
    }

    fn plan_open(&self, user: UserId, name: &str, tracks: &[TrackRef], retract: &[MessageId]) -> Plan {
        let mut actions: Vec<Action> = retract
            .iter()
            .map(|&message| Action::DeleteMessage { user, message })
            .collect();

        if tracks.is_empty() {
            actions.push(Action::SendText {
                user,
                text: text::playlist_empty(name),
                menu: None,
            });
        } else {
            actions.push(Action::SendText {
                user,
                text: text::playlist_header(name),
                menu: None,
            });
            actions.extend(tracks.iter().map(|track| Action::SendMedia {
                user,
                track: track.clone(),
            }));
        }

        Plan {
            user,
            actions,
            records_batch: true,
        }
    }

    /// Run a plan against the transport.
    ///
    /// Deletions go first and never fail the plan. Sends go out in order; if
    /// one fails, whatever already went out is still recorded as the batch so
    /// the next open can retract it, then the error is returned.
    pub async fn execute(&self, plan: Plan, transport: &dyn Transport) -> Result<Vec<MessageId>> {
        let mut deletions = Vec::new();
        let mut sends = Vec::new();
        for action in plan.actions {
            match action {
                Action::DeleteMessage { user, message } => deletions.push((user, message)),
                other => sends.push(other),
            }
        }

        let results = join_all(
            deletions
                .iter()
                .map(|&(user, message)| transport.delete_message(user, message)),
        )
        .await;
        for ((user, message), result) in deletions.iter().zip(results) {
            if let Err(e) = result {
                debug!("Couldn't retract message {} for user {}: {}", message, user, e);
            }
        }

        let mut sent = Vec::with_capacity(sends.len());
        let mut failure = None;
        for action in sends {
            let result = match &action {
                Action::SendText { user, text, menu } => {
                    transport.send_text(*user, text, menu.as_ref()).await
                }
                Action::SendMedia { user, track } => transport.send_media(*user, track).await,
                Action::DeleteMessage { .. } => continue,
            };
            match result {
                Ok(id) => sent.push(id),
                Err(e) => {
                    warn!("Send to user {} failed: {}", plan.user, e);
                    failure = Some(e);
                    break;
                }
            }
        }

        if plan.records_batch {
            self.sessions
                .record_sent_batch(plan.user, sent.clone())
                .await;
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(sent),
        }
    }
}
