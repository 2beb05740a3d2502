// The bot itself - one router, one planner, shared store and sessions
// Cheap to clone; hand a copy to every task that feeds it events

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::planner::ResponsePlanner;
use crate::router::{command, CommandRouter, Event, Outcome};
use crate::session::SessionRegistry;
use crate::store::{NamePolicy, PlaylistStore};
use crate::transport::Transport;
use crate::types::UserId;

#[derive(Clone)]
pub struct PlaylistBot {
    store: Arc<PlaylistStore>,
    sessions: Arc<SessionRegistry>,
    router: CommandRouter,
    planner: ResponsePlanner,
    // one event per user at a time; different users run in parallel
    user_locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl PlaylistBot {
    pub fn new(max_name_len: usize) -> Self {
        let policy = NamePolicy::new(max_name_len)
            .with_reserved_words(command::COMMAND_WORDS)
            .with_reserved_labels(command::MENU_LABELS);
        Self::with_parts(
            Arc::new(PlaylistStore::new(policy)),
            Arc::new(SessionRegistry::new()),
        )
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.playlists.max_name_len)
    }

    /// Build around existing store/registry instances
    pub fn with_parts(store: Arc<PlaylistStore>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            router: CommandRouter::new(Arc::clone(&store), Arc::clone(&sessions)),
            planner: ResponsePlanner::new(Arc::clone(&sessions)),
            store,
            sessions,
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<PlaylistStore> {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Route one event and deliver the reply.
    ///
    /// Store and session locks are released before anything goes to the
    /// transport. An error here is a delivery failure; the state change
    /// already happened.
    pub async fn handle(&self, event: Event, transport: &dyn Transport) -> Result<Outcome> {
        let user = event.user();
        let user_lock = self.user_lock(user).await;
        let _turn = user_lock.lock().await;

        debug!("Handling {:?}", event);
        let outcome = self.router.route(event).await;
        let plan = self.planner.plan(user, &outcome);
        self.planner.execute(plan, transport).await?;

        Ok(outcome)
    }

    async fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        Arc::clone(locks.entry(user).or_default())
    }

    /// Expire idle sessions and forget per-user locks nobody is holding
    pub async fn sweep(&self, max_idle: chrono::Duration) -> usize {
        let expired = self.sessions.expire_idle(max_idle).await;
        let mut locks = self.user_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        expired
    }

    /// Run `sweep` forever on a fixed period
    pub fn spawn_session_sweeper(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let bot = self.clone();
        let max_idle = chrono::Duration::from_std(max_idle)
            .unwrap_or_else(|_| chrono::Duration::days(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // first tick fires immediately, nothing to sweep yet
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = bot.sweep(max_idle).await;
                if expired > 0 {
                    info!("🧹 Session sweep expired {} session(s)", expired);
                }
            }
        })
    }
}
