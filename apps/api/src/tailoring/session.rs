//! In-process tailoring sessions.
//!
//! The core owns no persisted state; the application keeps each run's profile,
//! target description, summary and `SelectionState` here so the user can re-select
//! projects or draft a cover letter in later requests.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::cover_letter::CoverLetter;
use crate::errors::AppError;
use crate::profile::models::CandidateProfile;
use crate::tailoring::pipeline::TailoredResume;
use crate::tailoring::selection::SelectionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringSession {
    pub id: Uuid,
    pub profile: CandidateProfile,
    pub target_description: String,
    pub summary: String,
    pub selection: SelectionState,
    pub latest: TailoredResume,
    pub cover_letter: Option<CoverLetter>,
    /// Cover-letter feedback, oldest first.
    pub feedback: Vec<String>,
    /// Bumped on every write; a write based on an older revision is rejected.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TailoringSession {
    pub fn new(
        profile: CandidateProfile,
        target_description: String,
        summary: String,
        selection: SelectionState,
        latest: TailoredResume,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            profile,
            target_description,
            summary,
            selection,
            latest,
            cover_letter: None,
            feedback: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Bounded in-memory store. Sessions idle longer than `ttl` expire, and inserting
/// into a full store evicts the least recently updated session.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, TailoringSession>>,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    fn is_expired(&self, session: &TailoringSession, now: DateTime<Utc>) -> bool {
        (now - session.updated_at)
            .to_std()
            .is_ok_and(|age| age > self.ttl)
    }

    pub async fn insert(&self, session: TailoringSession) -> Uuid {
        let now = Utc::now();
        let id = session.id;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, s| !self.is_expired(s, now));
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.updated_at)
                .map(|s| s.id)
            else {
                break;
            };
            sessions.remove(&oldest);
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted tailoring sessions");
        }
        sessions.insert(id, session);
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<TailoringSession, AppError> {
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(session) if !self.is_expired(session, Utc::now()) => Ok(session.clone()),
            _ => Err(AppError::NotFound(format!("Session {id} not found"))),
        }
    }

    /// Applies `f` if the session is still at `expected_revision`, then bumps the
    /// revision and `updated_at`. A concurrent write in between is a conflict.
    pub async fn update<T>(
        &self,
        id: Uuid,
        expected_revision: u64,
        f: impl FnOnce(&mut TailoringSession) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        if session.revision != expected_revision {
            return Err(AppError::Conflict(format!(
                "Session {id} was modified by another request; reload and retry"
            )));
        }
        let result = f(session);
        session.revision += 1;
        session.updated_at = Utc::now();
        Ok(result)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
