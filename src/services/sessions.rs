use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::SessionEvent;
use crate::services::workflow::{BookingSession, SessionSettings};

pub type SharedSession = Arc<AsyncMutex<BookingSession>>;

/// Owns every live booking session. Sessions are in memory only; a restart
/// starts everyone over at browsing.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
    settings: SessionSettings,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            sessions: Mutex::new(HashMap::new()),
            settings,
            events_tx,
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(AsyncMutex::new(BookingSession::new(
            id,
            self.settings.clone(),
        )));
        self.map().insert(id, Arc::clone(&session));
        tracing::info!(session_id = %id, "session started");
        (id, session)
    }

    pub fn get(&self, id: Uuid) -> Result<SharedSession, AppError> {
        self.map()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {id}")))
    }

    /// The session whose current payment attempt uses `reference`.
    pub async fn find_by_reference(&self, reference: &str) -> Option<SharedSession> {
        let candidates: Vec<SharedSession> = self.map().values().cloned().collect();
        for session in candidates {
            if session.lock().await.payment_reference() == Some(reference) {
                return Some(session);
            }
        }
        None
    }

    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions untouched for longer than `max_idle`. Sessions busy in a
    /// transition are left alone.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut map = self.map();
        let before = map.len();
        map.retain(|_, session| match session.try_lock() {
            Ok(s) => s.updated_at() > cutoff,
            Err(_) => true,
        });
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkflowState;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = SessionRegistry::new(SessionSettings::default());
        let (id, _) = registry.create();

        let session = registry.get(id).unwrap();
        assert_eq!(session.lock().await.state(), WorkflowState::Browsing);
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.get(Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let registry = SessionRegistry::new(SessionSettings::default());
        let mut rx = registry.subscribe();
        let (id, _) = registry.create();

        registry.publish(SessionEvent {
            session_id: id,
            action: "select_service",
            from: WorkflowState::Browsing,
            to: WorkflowState::Booking,
            at: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id, id);
        assert_eq!(event.to, WorkflowState::Booking);
    }

    #[tokio::test]
    async fn test_prune_idle() {
        let registry = SessionRegistry::new(SessionSettings::default());
        registry.create();
        registry.create();

        assert_eq!(registry.prune_idle(Duration::minutes(30)), 0);
        assert_eq!(registry.prune_idle(Duration::minutes(-1)), 2);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_reference_without_payment() {
        let registry = SessionRegistry::new(SessionSettings::default());
        registry.create();
        assert!(registry.find_by_reference("WWT-1-abc").await.is_none());
    }
}
