// Command routing - the conversation state machine
// Reads the user's session, applies the store mutation, says what happened.
// Never touches the transport; the planner turns outcomes into messages.

pub mod command;
pub mod event;

pub use command::Command;
pub use event::{Button, Event};

use std::sync::Arc;
use tracing::debug;

use crate::error::{CommandError, PlaylistError};
use crate::session::{SessionRegistry, State};
use crate::store::PlaylistStore;
use crate::types::{MessageId, TrackRef, UserId};

/// What handling one event amounted to, with any data the reply needs
/// captured at the time of the mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Greeting,
    PromptPlaylistName,
    PlaylistCreated { name: String },
    TrackAdded { playlist: String, len: usize },
    NoActivePlaylist,
    PlaylistList { names: Vec<String> },
    PlaylistOpened {
        name: String,
        tracks: Vec<TrackRef>,
        /// Messages from the previous open, to be retracted first
        retract: Vec<MessageId>,
    },
    Settings { names: Vec<String> },
    PlaylistDeleted { name: String },
    PromptRenameTarget { old: String },
    PlaylistRenamed { old: String, new: String },
    TrackMenu { name: String, tracks: Vec<TrackRef> },
    TrackRemoved { name: String, position: usize },
    Failed(PlaylistError),
    Malformed(CommandError),
    /// Ordinary chatter we don't act on - not an error
    Unrecognized,
}

#[derive(Debug, Clone)]
pub struct CommandRouter {
    store: Arc<PlaylistStore>,
    sessions: Arc<SessionRegistry>,
}

impl CommandRouter {
    pub fn new(store: Arc<PlaylistStore>, sessions: Arc<SessionRegistry>) -> Self {
        Self { store, sessions }
    }

    pub async fn route(&self, event: Event) -> Outcome {
        match event {
            Event::Start(user) => self.start(user).await,
            Event::TextInput(user, text) => self.text(user, &text).await,
            Event::MediaInput(user, track) => self.add_track(user, track).await,
            Event::ButtonAction(user, button) => self.press(user, button).await,
        }
    }

    async fn start(&self, user: UserId) -> Outcome {
        self.sessions.set_state(user, State::Idle).await;
        Outcome::Greeting
    }

    async fn text(&self, user: UserId, text: &str) -> Outcome {
        let text = text.trim();
        let state = self.sessions.state(user).await;

        // Keyboard labels are presses, even in the middle of a prompt.
        // Everything else typed during a prompt is the answer to it.
        match (state, command::parse(text)) {
            (_, Some(Ok(Command::Start))) => self.start(user).await,
            (_, Some(Ok(Command::Button(button)))) => self.press(user, button).await,
            (State::AwaitingPlaylistName, _) => self.finish_create(user, text).await,
            (State::AwaitingRenameTarget { old }, _) => self.finish_rename(user, &old, text).await,
            (_, Some(Ok(Command::Delete { name }))) => self.delete(&name).await,
            (_, Some(Ok(Command::Rename { old, new }))) => self.rename(user, &old, &new).await,
            (_, Some(Ok(Command::RemoveTrack { name, position }))) => {
                self.remove_track(&name, position).await
            }
            (_, Some(Err(err))) => Outcome::Malformed(err),
            (_, None) => {
                if self.store.contains(text).await {
                    self.open(user, text).await
                } else {
                    debug!("Unrecognized input from user {}: '{}'", user, text);
                    Outcome::Unrecognized
                }
            }
        }
    }

    async fn press(&self, user: UserId, button: Button) -> Outcome {
        match button {
            Button::CreatePlaylist => {
                self.sessions
                    .set_state(user, State::AwaitingPlaylistName)
                    .await;
                Outcome::PromptPlaylistName
            }
            Button::ListPlaylists => Outcome::PlaylistList {
                names: self.store.list().await,
            },
            Button::OpenPlaylist(name) => self.open(user, &name).await,
            Button::OpenSettings => Outcome::Settings {
                names: self.store.list().await,
            },
            Button::DeletePlaylist(name) => self.delete(&name).await,
            Button::RenamePlaylist(old) => {
                if !self.store.contains(&old).await {
                    return Outcome::Failed(PlaylistError::NotFound(old));
                }
                self.sessions
                    .set_state(user, State::AwaitingRenameTarget { old: old.clone() })
                    .await;
                Outcome::PromptRenameTarget { old }
            }
            Button::RemoveTrackMenu(name) => match self.store.get(&name).await {
                Ok(tracks) => Outcome::TrackMenu { name, tracks },
                Err(err) => Outcome::Failed(err),
            },
            Button::RemoveTrackAt(name, position) => self.remove_track(&name, position).await,
        }
    }

    async fn finish_create(&self, user: UserId, name: &str) -> Outcome {
        // on failure the prompt stays open so the user can try another name
        if let Err(err) = self.store.create(name).await {
            return Outcome::Failed(err);
        }
        match self.activate(user, name).await {
            Ok(()) => Outcome::PlaylistCreated {
                name: name.to_string(),
            },
            Err(err) => Outcome::Failed(err),
        }
    }

    async fn finish_rename(&self, user: UserId, old: &str, new: &str) -> Outcome {
        let outcome = self.rename(user, old, new).await;
        if let Outcome::Failed(PlaylistError::NotFound(_)) = outcome {
            // nothing left to rename, drop the prompt
            self.sessions.set_state(user, State::Idle).await;
        }
        outcome
    }

    async fn rename(&self, user: UserId, old: &str, new: &str) -> Outcome {
        match self.store.rename(old, new).await {
            Ok(()) => {
                self.sessions.retarget_playlist(old, new).await;
                self.sessions.set_state(user, active(new)).await;
                Outcome::PlaylistRenamed {
                    old: old.to_string(),
                    new: new.to_string(),
                }
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    async fn delete(&self, name: &str) -> Outcome {
        match self.store.delete(name).await {
            Ok(_) => {
                self.sessions.invalidate_playlist(name).await;
                Outcome::PlaylistDeleted {
                    name: name.to_string(),
                }
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    async fn open(&self, user: UserId, name: &str) -> Outcome {
        let tracks = match self.store.get(name).await {
            Ok(tracks) => tracks,
            Err(err) => return Outcome::Failed(err),
        };

        let retract = self.sessions.take_sent_batch(user).await;
        if let Err(err) = self.activate(user, name).await {
            // the old batch is still on screen
            self.sessions.record_sent_batch(user, retract).await;
            return Outcome::Failed(err);
        }
        Outcome::PlaylistOpened {
            name: name.to_string(),
            tracks,
            retract,
        }
    }

    async fn add_track(&self, user: UserId, track: TrackRef) -> Outcome {
        let name = match self.sessions.state(user).await {
            State::ActivePlaylist { name } => name,
            _ => return Outcome::NoActivePlaylist,
        };

        match self.store.append_track(&name, track).await {
            Ok(len) => Outcome::TrackAdded { playlist: name, len },
            Err(PlaylistError::NotFound(_)) => {
                // deleted out from under us
                self.sessions.set_state(user, State::Idle).await;
                Outcome::NoActivePlaylist
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    async fn remove_track(&self, name: &str, position: usize) -> Outcome {
        match self.store.remove_track_at(name, position).await {
            Ok(_) => Outcome::TrackRemoved {
                name: name.to_string(),
                position,
            },
            Err(err) => Outcome::Failed(err),
        }
    }

    /// Make `name` the user's active playlist. The store is checked again
    /// after the state is set: a delete or rename that slipped in between
    /// an earlier lookup and `set_state` would otherwise leave the user
    /// pointing at a name nobody invalidates.
    async fn activate(&self, user: UserId, name: &str) -> Result<(), PlaylistError> {
        self.sessions.set_state(user, active(name)).await;
        if self.store.contains(name).await {
            return Ok(());
        }
        self.sessions.set_state(user, State::Idle).await;
        Err(PlaylistError::NotFound(name.to_string()))
    }
}

fn active(name: &str) -> State {
    State::ActivePlaylist {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::command::{LABEL_LIST, LABEL_NEW_PLAYLIST, USAGE_RENAME};
    use super::*;
    use crate::store::NamePolicy;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    struct Fixture {
        router: CommandRouter,
        store: Arc<PlaylistStore>,
        sessions: Arc<SessionRegistry>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(PlaylistStore::new(
            NamePolicy::default()
                .with_reserved_words(command::COMMAND_WORDS)
                .with_reserved_labels(command::MENU_LABELS),
        ));
        let sessions = Arc::new(SessionRegistry::new());
        Fixture {
            router: CommandRouter::new(Arc::clone(&store), Arc::clone(&sessions)),
            store,
            sessions,
        }
    }

    fn text(user: UserId, text: &str) -> Event {
        Event::TextInput(user, text.to_string())
    }

    fn media(user: UserId, id: &str) -> Event {
        Event::MediaInput(user, TrackRef::from(id))
    }

    fn button(user: UserId, button: Button) -> Event {
        Event::ButtonAction(user, button)
    }

    impl Fixture {
        async fn create(&self, user: UserId, name: &str) {
            self.router.route(button(user, Button::CreatePlaylist)).await;
            let outcome = self.router.route(text(user, name)).await;
            assert_eq!(outcome, Outcome::PlaylistCreated { name: name.to_string() });
        }
    }

    #[tokio::test]
    async fn test_create_flow() {
        let fx = fixture();

        assert_eq!(
            fx.router.route(button(ALICE, Button::CreatePlaylist)).await,
            Outcome::PromptPlaylistName
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::AwaitingPlaylistName);

        assert_eq!(
            fx.router.route(text(ALICE, "  Road Trip ")).await,
            Outcome::PlaylistCreated { name: "Road Trip".to_string() }
        );
        assert_eq!(fx.sessions.state(ALICE).await, active("Road Trip"));
    }

    #[tokio::test]
    async fn test_create_collision_keeps_prompt() {
        let fx = fixture();
        fx.create(ALICE, "A").await;

        fx.router.route(text(BOB, LABEL_NEW_PLAYLIST)).await;
        assert_eq!(
            fx.router.route(text(BOB, "A")).await,
            Outcome::Failed(PlaylistError::AlreadyExists("A".to_string()))
        );
        assert_eq!(fx.sessions.state(BOB).await, State::AwaitingPlaylistName);
        assert_eq!(fx.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_label_during_prompt_is_a_press() {
        let fx = fixture();
        fx.router.route(button(ALICE, Button::CreatePlaylist)).await;

        assert_eq!(
            fx.router.route(text(ALICE, LABEL_LIST)).await,
            Outcome::PlaylistList { names: vec![] }
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::AwaitingPlaylistName);
    }

    #[tokio::test]
    async fn test_start_cancels_prompt() {
        let fx = fixture();
        fx.router.route(button(ALICE, Button::CreatePlaylist)).await;

        assert_eq!(fx.router.route(Event::Start(ALICE)).await, Outcome::Greeting);
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
    }

    #[tokio::test]
    async fn test_media_goes_to_active_playlist() {
        let fx = fixture();
        fx.create(ALICE, "Road Trip").await;

        assert_eq!(
            fx.router.route(media(ALICE, "t1")).await,
            Outcome::TrackAdded { playlist: "Road Trip".to_string(), len: 1 }
        );
        fx.router.route(media(ALICE, "t2")).await;

        match fx.router.route(text(ALICE, "Road Trip")).await {
            Outcome::PlaylistOpened { tracks, .. } => {
                assert_eq!(tracks, vec![TrackRef::from("t1"), TrackRef::from("t2")]);
            }
            other => panic!("expected open, got {:?}", other),
        }
        assert_eq!(fx.store.list().await, vec!["Road Trip".to_string()]);
    }

    #[tokio::test]
    async fn test_media_without_playlist() {
        let fx = fixture();
        assert_eq!(fx.router.route(media(ALICE, "t1")).await, Outcome::NoActivePlaylist);

        fx.router.route(button(ALICE, Button::CreatePlaylist)).await;
        assert_eq!(fx.router.route(media(ALICE, "t1")).await, Outcome::NoActivePlaylist);
        assert_eq!(fx.sessions.state(ALICE).await, State::AwaitingPlaylistName);
    }

    #[tokio::test]
    async fn test_delete_resets_everyone_on_it() {
        let fx = fixture();
        fx.create(ALICE, "A").await;
        fx.router.route(button(BOB, Button::OpenPlaylist("A".to_string()))).await;

        assert_eq!(
            fx.router.route(button(ALICE, Button::DeletePlaylist("A".to_string()))).await,
            Outcome::PlaylistDeleted { name: "A".to_string() }
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
        assert_eq!(fx.sessions.state(BOB).await, State::Idle);
        assert_eq!(fx.router.route(media(BOB, "t")).await, Outcome::NoActivePlaylist);
    }

    #[tokio::test]
    async fn test_media_after_concurrent_delete_resets_lazily() {
        let fx = fixture();
        fx.create(ALICE, "A").await;
        // straight to the store, so no session gets invalidated
        fx.store.delete("A").await.unwrap();

        assert_eq!(fx.router.route(media(ALICE, "t")).await, Outcome::NoActivePlaylist);
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
    }

    #[tokio::test]
    async fn test_rename_flow() {
        let fx = fixture();
        fx.create(ALICE, "A").await;
        fx.router.route(media(ALICE, "t1")).await;
        fx.router.route(button(BOB, Button::OpenPlaylist("A".to_string()))).await;

        assert_eq!(
            fx.router.route(button(ALICE, Button::RenamePlaylist("A".to_string()))).await,
            Outcome::PromptRenameTarget { old: "A".to_string() }
        );
        assert_eq!(
            fx.router.route(text(ALICE, "B")).await,
            Outcome::PlaylistRenamed { old: "A".to_string(), new: "B".to_string() }
        );

        assert_eq!(fx.store.get("B").await.unwrap(), vec![TrackRef::from("t1")]);
        assert!(!fx.store.contains("A").await);
        assert_eq!(fx.sessions.state(ALICE).await, active("B"));
        assert_eq!(fx.sessions.state(BOB).await, active("B"));
    }

    #[tokio::test]
    async fn test_rename_conflict_keeps_prompt() {
        let fx = fixture();
        fx.create(ALICE, "A").await;
        fx.create(ALICE, "B").await;

        fx.router.route(button(ALICE, Button::RenamePlaylist("A".to_string()))).await;
        assert_eq!(
            fx.router.route(text(ALICE, "B")).await,
            Outcome::Failed(PlaylistError::AlreadyExists("B".to_string()))
        );
        assert_eq!(
            fx.sessions.state(ALICE).await,
            State::AwaitingRenameTarget { old: "A".to_string() }
        );
    }

    #[tokio::test]
    async fn test_rename_target_vanished() {
        let fx = fixture();
        fx.create(ALICE, "A").await;
        fx.router.route(button(ALICE, Button::RenamePlaylist("A".to_string()))).await;
        fx.store.delete("A").await.unwrap();

        assert_eq!(
            fx.router.route(text(ALICE, "B")).await,
            Outcome::Failed(PlaylistError::NotFound("A".to_string()))
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
    }

    #[tokio::test]
    async fn test_rename_unknown_playlist_button() {
        let fx = fixture();
        assert_eq!(
            fx.router.route(button(ALICE, Button::RenamePlaylist("X".to_string()))).await,
            Outcome::Failed(PlaylistError::NotFound("X".to_string()))
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
    }

    #[tokio::test]
    async fn test_text_commands() {
        let fx = fixture();
        fx.create(ALICE, "Mix").await;
        for id in ["a", "b", "c"] {
            fx.router.route(media(ALICE, id)).await;
        }
        fx.router.route(Event::Start(ALICE)).await;

        assert_eq!(
            fx.router.route(text(ALICE, "удалить трек Mix 2")).await,
            Outcome::TrackRemoved { name: "Mix".to_string(), position: 2 }
        );
        assert!(matches!(
            fx.router.route(text(ALICE, "удалить трек Mix 9")).await,
            Outcome::Failed(PlaylistError::IndexOutOfRange { position: 9, len: 2, .. })
        ));
        assert_eq!(
            fx.router.route(text(ALICE, "переименовать Mix")).await,
            Outcome::Malformed(CommandError::MalformedCommand { usage: USAGE_RENAME })
        );
        assert_eq!(
            fx.router.route(text(ALICE, "переименовать Mix Tape")).await,
            Outcome::PlaylistRenamed { old: "Mix".to_string(), new: "Tape".to_string() }
        );
        assert_eq!(fx.sessions.state(ALICE).await, active("Tape"));
        assert_eq!(
            fx.router.route(text(ALICE, "удалить Tape")).await,
            Outcome::PlaylistDeleted { name: "Tape".to_string() }
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
        assert_eq!(
            fx.router.route(text(ALICE, "удалить Tape")).await,
            Outcome::Failed(PlaylistError::NotFound("Tape".to_string()))
        );
    }

    #[tokio::test]
    async fn test_open_takes_previous_batch() {
        let fx = fixture();
        fx.create(ALICE, "A").await;
        fx.create(ALICE, "B").await;
        fx.sessions
            .record_sent_batch(ALICE, vec![MessageId(5), MessageId(6)])
            .await;

        assert_eq!(
            fx.router.route(button(ALICE, Button::OpenPlaylist("B".to_string()))).await,
            Outcome::PlaylistOpened {
                name: "B".to_string(),
                tracks: vec![],
                retract: vec![MessageId(5), MessageId(6)],
            }
        );
        assert_eq!(fx.sessions.state(ALICE).await, active("B"));
    }

    #[tokio::test]
    async fn test_open_missing_playlist_keeps_batch() {
        let fx = fixture();
        fx.sessions.record_sent_batch(ALICE, vec![MessageId(5)]).await;

        assert_eq!(
            fx.router.route(button(ALICE, Button::OpenPlaylist("nope".to_string()))).await,
            Outcome::Failed(PlaylistError::NotFound("nope".to_string()))
        );
        assert_eq!(fx.sessions.take_sent_batch(ALICE).await, vec![MessageId(5)]);
    }

    #[tokio::test]
    async fn test_remove_track_menu() {
        let fx = fixture();
        fx.create(ALICE, "Mix").await;
        fx.router.route(media(ALICE, "a")).await;

        assert_eq!(
            fx.router.route(button(ALICE, Button::RemoveTrackMenu("Mix".to_string()))).await,
            Outcome::TrackMenu { name: "Mix".to_string(), tracks: vec![TrackRef::from("a")] }
        );
        assert_eq!(
            fx.router.route(button(ALICE, Button::RemoveTrackAt("Mix".to_string(), 1))).await,
            Outcome::TrackRemoved { name: "Mix".to_string(), position: 1 }
        );
        assert_eq!(fx.sessions.state(ALICE).await, active("Mix"));
    }

    #[tokio::test]
    async fn test_unrecognized_text() {
        let fx = fixture();
        assert_eq!(fx.router.route(text(ALICE, "hello?")).await, Outcome::Unrecognized);
        fx.create(ALICE, "A").await;
        assert_eq!(fx.router.route(text(ALICE, "a")).await, Outcome::Unrecognized);
    }

    #[tokio::test]
    async fn test_reserved_name_rejected_in_prompt() {
        let fx = fixture();
        fx.router.route(button(ALICE, Button::CreatePlaylist)).await;

        assert!(matches!(
            fx.router.route(text(ALICE, "удалить всё")).await,
            Outcome::Failed(PlaylistError::InvalidName { .. })
        ));
        assert_eq!(fx.sessions.state(ALICE).await, State::AwaitingPlaylistName);
    }

    #[tokio::test]
    async fn test_every_creatable_name_can_be_deleted_by_text() {
        let fx = fixture();
        fx.router.route(button(ALICE, Button::CreatePlaylist)).await;
        for name in ["трек X", "Трек", "трек"] {
            assert!(matches!(
                fx.router.route(text(ALICE, name)).await,
                Outcome::Failed(PlaylistError::InvalidName { .. })
            ));
        }

        fx.router.route(text(ALICE, "Трековый микс")).await;
        assert_eq!(
            fx.router.route(text(ALICE, "удалить Трековый микс")).await,
            Outcome::PlaylistDeleted { name: "Трековый микс".to_string() }
        );
    }

    #[tokio::test]
    async fn test_activate_vanished_playlist_goes_idle() {
        let fx = fixture();
        fx.sessions.set_state(ALICE, State::AwaitingPlaylistName).await;

        assert_eq!(
            fx.router.activate(ALICE, "Gone").await,
            Err(PlaylistError::NotFound("Gone".to_string()))
        );
        assert_eq!(fx.sessions.state(ALICE).await, State::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_open_racing_delete_never_leaves_stale_state() {
        let fx = fixture();
        for round in 0..50 {
            fx.store.create("X").await.unwrap();

            let opener = {
                let router = fx.router.clone();
                tokio::spawn(async move {
                    router.route(button(ALICE, Button::OpenPlaylist("X".to_string()))).await
                })
            };
            let deleter = {
                let router = fx.router.clone();
                tokio::spawn(async move {
                    if round % 2 == 0 {
                        router.route(button(BOB, Button::DeletePlaylist("X".to_string()))).await
                    } else {
                        router.route(text(BOB, "переименовать X Y")).await
                    }
                })
            };
            opener.await.unwrap();
            deleter.await.unwrap();

            // whatever the interleaving, Alice never points at a missing playlist
            if let State::ActivePlaylist { name } = fx.sessions.state(ALICE).await {
                assert!(fx.store.contains(&name).await, "stale active playlist '{}'", name);
            }

            fx.store.delete("Y").await.ok();
            fx.store.delete("X").await.ok();
            fx.sessions.set_state(ALICE, State::Idle).await;
        }
    }
}
