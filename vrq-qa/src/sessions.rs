//! Live participant sessions
//!
//! Sessions are addressed by a random token carried in the survey URL.
//! Each session sits behind its own mutex so that requests for one
//! participant run one at a time; a double-submitted form waits for the
//! first request and then hits duplicate suppression.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;
use vrq_common::Session;

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    created_at: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    entries: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Register a session and return its token
    pub async fn insert(&self, session: Session) -> Uuid {
        let token = Uuid::new_v4();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(session)),
            created_at: Instant::now(),
        };
        self.entries.write().await.insert(token, entry);
        token
    }

    pub async fn get(&self, token: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.entries
            .read()
            .await
            .get(&token)
            .map(|entry| Arc::clone(&entry.session))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions older than the TTL, returning how many were dropped
    pub async fn sweep_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Sweep expired sessions every `every`
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = registry.sweep_expired().await;
                if removed > 0 {
                    info!("Expired {} sessions", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrq_common::{QuestionItem, QuestionPool};

    fn session() -> Session {
        let pool = Arc::new(QuestionPool::from_items(vec![QuestionItem {
            left_image_id: "a.png".to_string(),
            right_image_id: "a.png".to_string(),
            group: "car".to_string(),
            annotated_group: "car".to_string(),
        }]));
        Session::initialize(pool, 1, "p").unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let token = registry.insert(session()).await;

        let found = registry.get(token).await.unwrap();
        assert_eq!(found.lock().await.participant_id(), "p");
        assert!(registry.get(Uuid::new_v4()).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_sessions() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        registry.insert(session()).await;
        assert_eq!(registry.sweep_expired().await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_expired_sessions() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let token = registry.insert(session()).await;
        registry.insert(session()).await;

        assert_eq!(registry.sweep_expired().await, 2);
        assert!(registry.is_empty().await);
        assert!(registry.get(token).await.is_none());
    }

    #[tokio::test]
    async fn test_expiry_counts_from_start_not_last_use() {
        let registry = SessionRegistry::new(Duration::from_millis(50));
        let token = registry.insert(session()).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(registry.get(token).await.is_some());
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(registry.sweep_expired().await, 1);
        assert!(registry.get(token).await.is_none());
    }
}
