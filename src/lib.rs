// tunebot library - playlist chat bot core
// State machine + store; the chat transport plugs in from outside

pub mod bot;       // wires router + planner over shared state
pub mod config;    // settings and preferences
pub mod error;     // typed, user-facing failures
pub mod planner;   // outcome -> messages, retraction
pub mod router;    // per-user conversation state machine
pub mod session;   // per-user state and sent batches
pub mod store;     // playlists shared by everyone
pub mod transport; // delivery boundary (console impl behind a feature)
pub mod types;     // ids and track refs

// Export the stuff other modules actually use
pub use bot::PlaylistBot;
pub use config::Config;
pub use error::{CommandError, PlaylistError};
pub use router::{Button, Event, Outcome};
pub use session::{SessionRegistry, State};
pub use store::PlaylistStore;
pub use transport::Transport;
pub use types::{MessageId, TrackRef, UserId};
