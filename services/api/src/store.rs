//! Session persistence.
//!
//! Records are kept behind a narrow async trait so a database-backed store
//! can replace the in-memory one without touching the handlers or the
//! WebSocket loop.

use crate::models::{RecordStatus, SessionRecord};
use anyhow::Result;
use async_trait::async_trait;
use avi_core::phrase::Level;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Records a freshly started session as active.
    async fn create_session(&self, id: Uuid, topic: &str, level: Level) -> Result<SessionRecord>;

    /// Marks a session ended with its final clock and score.
    async fn finalize_session(
        &self,
        id: Uuid,
        duration_seconds: u64,
        final_score: Option<u8>,
    ) -> Result<Option<SessionRecord>>;

    /// All sessions, most recently started first.
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>>;

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>>;
}

/// Process-local store; contents vanish on restart.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, id: Uuid, topic: &str, level: Level) -> Result<SessionRecord> {
        let record = SessionRecord {
            id,
            topic: topic.to_string(),
            level,
            status: RecordStatus::Active,
            started_at: Utc::now(),
            duration_seconds: 0,
            final_score: None,
        };
        self.sessions.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn finalize_session(
        &self,
        id: Uuid,
        duration_seconds: u64,
        final_score: Option<u8>,
    ) -> Result<Option<SessionRecord>> {
        let mut sessions = self.sessions.write().await;
        let Some(record) = sessions.get_mut(&id) else {
            return Ok(None);
        };
        record.status = RecordStatus::Ended;
        record.duration_seconds = duration_seconds;
        record.final_score = final_score;
        Ok(Some(record.clone()))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        let sessions = self.sessions.read().await;
        let mut records: Vec<SessionRecord> = sessions.values().cloned().collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }
}
