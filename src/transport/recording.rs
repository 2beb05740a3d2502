// Test transport - remembers everything it was asked to do

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use super::Transport;
use crate::planner::Menu;
use crate::types::{MessageId, TrackRef, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Text {
        user: UserId,
        id: MessageId,
        text: String,
        menu: Option<Menu>,
    },
    Media {
        user: UserId,
        id: MessageId,
        track: TrackRef,
    },
    Deleted {
        user: UserId,
        id: MessageId,
    },
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    next_id: AtomicI64,
    log: Mutex<Vec<Delivered>>,
    live: Mutex<HashSet<MessageId>>,
    fail_deletes: AtomicBool,
    failing_track: Mutex<Option<TrackRef>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make sending this one track fail
    pub fn fail_track(&self, track: TrackRef) {
        *self.failing_track.lock().unwrap() = Some(track);
    }

    pub fn log(&self) -> Vec<Delivered> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn texts(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|d| match d {
                Delivered::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.log()
            .into_iter()
            .filter_map(|d| match d {
                Delivered::Deleted { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Ids of everything sent, in order
    pub fn sent_ids(&self) -> Vec<MessageId> {
        self.log()
            .into_iter()
            .filter_map(|d| match d {
                Delivered::Text { id, .. } | Delivered::Media { id, .. } => Some(id),
                Delivered::Deleted { .. } => None,
            })
            .collect()
    }

    fn next(&self) -> MessageId {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().unwrap().insert(id);
        id
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, user: UserId, text: &str, menu: Option<&Menu>) -> Result<MessageId> {
        let id = self.next();
        self.log.lock().unwrap().push(Delivered::Text {
            user,
            id,
            text: text.to_string(),
            menu: menu.cloned(),
        });
        Ok(id)
    }

    async fn send_media(&self, user: UserId, track: &TrackRef) -> Result<MessageId> {
        if self.failing_track.lock().unwrap().as_ref() == Some(track) {
            return Err(anyhow!("upload of {} failed", track));
        }
        let id = self.next();
        self.log.lock().unwrap().push(Delivered::Media {
            user,
            id,
            track: track.clone(),
        });
        Ok(id)
    }

    async fn delete_message(&self, user: UserId, message: MessageId) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(Delivered::Deleted { user, id: message });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow!("message {} can't be deleted", message));
        }
        if !self.live.lock().unwrap().remove(&message) {
            return Err(anyhow!("message {} not found", message));
        }
        Ok(())
    }
}
