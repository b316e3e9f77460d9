use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::conversation::state::ConversationState;

/// A session is locked for the whole of a request, so two requests for the
/// same session run one after the other while other sessions proceed.
pub type SharedSession = Arc<Mutex<ConversationState>>;

/// In-memory session registry keyed by session id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub async fn create(&self) -> SharedSession {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ConversationState::new(id)));
        self.sessions.write().await.insert(id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Discards the session's state. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::state::Phase;

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::default();
        let id = store.create().await.lock().await.id;
        assert_eq!(store.len().await, 1);
        assert!(store.get(id).await.is_some());
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::default();
        let a = store.create().await;
        let b = store.create().await;
        a.lock().await.cancel();
        assert_eq!(b.lock().await.phase(), Phase::Collecting);
    }
}
