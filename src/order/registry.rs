use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::engine::OrderSelectionEngine;

const DEFAULT_IDLE_TTL: Duration = Duration::minutes(30);

#[derive(Clone)]
pub struct SessionEntry {
    pub engine: Arc<OrderSelectionEngine>,
    pub opened_at: OffsetDateTime,
}

struct Slot {
    entry: SessionEntry,
    last_seen: OffsetDateTime,
}

/// Live customization sessions keyed by session id.
///
/// A session nobody has looked up for longer than the idle TTL is discarded
/// on the next prune.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Slot>>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn insert(&self, engine: OrderSelectionEngine) -> (Uuid, SessionEntry) {
        let now = OffsetDateTime::now_utc();
        self.prune_expired_at(now);

        let id = Uuid::new_v4();
        let entry = SessionEntry {
            engine: Arc::new(engine),
            opened_at: now,
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Slot {
                    entry: entry.clone(),
                    last_seen: now,
                },
            );
        (id, entry)
    }

    /// Looks a session up and marks it as active.
    pub fn get(&self, id: Uuid) -> Option<SessionEntry> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let slot = sessions.get_mut(&id)?;
        slot.last_seen = OffsetDateTime::now_utc();
        Some(slot.entry.clone())
    }

    /// Drops the session and discards its engine so late responses are ignored.
    pub fn remove(&self, id: Uuid) -> Option<SessionEntry> {
        let entry = self.release(id);
        if let Some(entry) = &entry {
            entry.engine.discard();
        }
        entry
    }

    /// Forgets a session without discarding it.
    pub fn release(&self, id: Uuid) -> Option<SessionEntry> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|slot| slot.entry)
    }

    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(OffsetDateTime::now_utc())
    }

    /// Discards every session idle since before `now - idle_ttl`.
    pub fn prune_expired_at(&self, now: OffsetDateTime) -> usize {
        let Some(cutoff) = now.checked_sub(self.idle_ttl) else {
            return 0;
        };
        let expired: Vec<(Uuid, SessionEntry)> = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, slot)| slot.last_seen < cutoff)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|slot| (id, slot.entry)))
                .collect()
        };
        for (id, entry) in &expired {
            entry.engine.discard();
            debug!(session_id = %id, "idle session expired");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryDataApi;
    use crate::order::engine::{EngineOptions, SessionStatus};

    fn engine() -> OrderSelectionEngine {
        OrderSelectionEngine::new(Arc::new(InMemoryDataApi::new()), EngineOptions::default())
    }

    #[test]
    fn remove_discards_the_engine() {
        let registry = SessionRegistry::default();
        let (id, entry) = registry.insert(engine());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(id).is_some());

        registry.remove(id);
        assert!(registry.is_empty());
        assert_eq!(entry.engine.status(), SessionStatus::Discarded);
    }

    #[test]
    fn release_keeps_engine_state() {
        let registry = SessionRegistry::default();
        let (id, entry) = registry.insert(engine());
        registry.release(id);
        assert!(registry.get(id).is_none());
        assert_eq!(entry.engine.status(), SessionStatus::Uninitialized);
    }

    #[test]
    fn idle_sessions_are_discarded_after_ttl() {
        let registry = SessionRegistry::new(Duration::seconds(60));
        let (id, entry) = registry.insert(engine());
        let now = OffsetDateTime::now_utc();

        assert_eq!(registry.prune_expired_at(now + Duration::seconds(30)), 0);
        assert!(registry.get(id).is_some());

        assert_eq!(registry.prune_expired_at(now + Duration::seconds(120)), 1);
        assert!(registry.get(id).is_none());
        assert_eq!(entry.engine.status(), SessionStatus::Discarded);
    }

    #[test]
    fn huge_ttl_never_expires() {
        let registry = SessionRegistry::new(Duration::MAX);
        registry.insert(engine());
        assert_eq!(registry.prune_expired(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insert_prunes_expired_sessions() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let (_, stale) = registry.insert(engine());
        std::thread::sleep(std::time::Duration::from_millis(5));

        let (fresh_id, _) = registry.insert(engine());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(fresh_id).is_some());
        assert_eq!(stale.engine.status(), SessionStatus::Discarded);
    }
}
