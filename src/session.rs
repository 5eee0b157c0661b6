//! Ephemeral conversation sessions.
//!
//! Sessions live in memory only. The query service creates one per query and
//! deletes it when the query is done.

use crate::error::{BirdingError, Result};
use crate::runner::Event;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A single conversation context.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: HashMap<String, Value>,
    pub events: Vec<Event>,
    pub created_at: DateTime<Utc>,
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh id.
    pub async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        state: HashMap<String, Value>,
    ) -> Result<Session> {
        if app_name.trim().is_empty() || user_id.trim().is_empty() {
            return Err(BirdingError::Session(
                "app name and user id are required".to_string(),
            ));
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            state,
            events: Vec::new(),
            created_at: Utc::now(),
        };

        debug!("Created session {} for {}/{}", session.id, app_name, user_id);
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Look up a session owned by the given app and user.
    pub async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .cloned()
    }

    /// Record an event in a session's history.
    pub async fn append_event(&self, session_id: &str, event: Event) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| BirdingError::Session(format!("Session not found: {}", session_id)))?;
        session.events.push(event);
        Ok(())
    }

    /// Remove a session. Returns whether it existed.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::EventKind;

    #[tokio::test]
    async fn test_sessions_are_unique_and_scoped() {
        let service = InMemorySessionService::new();
        let a = service
            .create_session("birding_app", "test", HashMap::new())
            .await
            .unwrap();
        let b = service
            .create_session("birding_app", "test", HashMap::new())
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.state.is_empty());
        assert_eq!(service.session_count().await, 2);
        assert!(service.get_session("birding_app", "test", &a.id).await.is_some());
        assert!(service.get_session("birding_app", "someone_else", &a.id).await.is_none());

        assert!(service.delete_session(&a.id).await);
        assert!(!service.delete_session(&a.id).await);
        assert_eq!(service.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_append_event() {
        let service = InMemorySessionService::new();
        let session = service
            .create_session("birding_app", "test", HashMap::new())
            .await
            .unwrap();

        let event = Event::new("inv-1", "user", EventKind::UserMessage("hi".to_string()));
        service.append_event(&session.id, event.clone()).await.unwrap();

        let stored = service
            .get_session("birding_app", "test", &session.id)
            .await
            .unwrap();
        assert_eq!(stored.events, vec![event]);

        let missing = Event::new("inv-2", "user", EventKind::UserMessage("x".to_string()));
        assert!(service.append_event("nope", missing).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_user_is_rejected() {
        let service = InMemorySessionService::new();
        assert!(service
            .create_session("birding_app", " ", HashMap::new())
            .await
            .is_err());
    }
}
