// Participant Registry - lazily created participant handles

use crate::domain::{Participant, ParticipantId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Every participant seen by one queue scope.
///
/// Participants are created on their first submission attempt and never
/// reclaimed here.
#[derive(Default)]
pub struct ParticipantRegistry {
    participants: RwLock<HashMap<ParticipantId, Arc<Participant>>>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a participant, creating it on first sight
    pub fn get_or_create(&self, id: &str) -> Arc<Participant> {
        if let Some(existing) = self.participants.read().get(id) {
            return Arc::clone(existing);
        }

        let mut participants = self.participants.write();
        Arc::clone(participants.entry(id.to_string()).or_insert_with(|| {
            debug!(participant_id = %id, "New participant");
            Arc::new(Participant::new(id))
        }))
    }

    pub fn get(&self, id: &str) -> Option<Arc<Participant>> {
        self.participants.read().get(id).cloned()
    }

    /// Snapshot of every handle, in no particular order
    pub fn all(&self) -> Vec<Arc<Participant>> {
        self.participants.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.participants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_returns_same_handle() {
        let registry = ParticipantRegistry::new();
        let first = registry.get_or_create("alice");
        let second = registry.get_or_create("alice");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("bob").is_none());
    }

    #[test]
    fn test_concurrent_creation_yields_one_participant() {
        let registry = Arc::new(ParticipantRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_create("racer"))
            })
            .collect();

        let created: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(created.iter().all(|p| Arc::ptr_eq(p, &created[0])));
        assert_eq!(registry.len(), 1);
    }
}
