//! Port traits for the event log and the state store, with in-memory
//! reference implementations.
//!
//! The control loop's only boundary is these two narrow contracts: events
//! can be fetched by a time cursor, and the single most-recent state
//! snapshot can be loaded and saved. Durable adapters live in `attune-db`;
//! the in-memory implementations here are the test substrate and the
//! no-database run mode.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use attune_types::{Event, LifeSystemState};
use chrono::{DateTime, Utc};

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store failed (connection lost, query failed, etc.).
    #[error("store backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// A stored payload could not be decoded.
    #[error("store decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
}

/// Read contract over the host app's activity event log.
///
/// Implementations must return events in ascending timestamp order and may
/// return an empty batch. The control loop only reads; it never mutates or
/// deletes events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch all events with timestamp at or after `since`, ascending.
    async fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<Event>, StoreError>;
}

/// Contract over the single most-recent state snapshot.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last saved snapshot. `None` only before the first
    /// successful tick.
    async fn load(&self) -> Result<Option<LifeSystemState>, StoreError>;

    /// Save the snapshot. Must be durable before the call returns; the
    /// driver treats this as its commit point.
    async fn save(&self, state: &LifeSystemState) -> Result<(), StoreError>;
}

/// In-memory event log.
///
/// Keeps events sorted by timestamp on insert so reads never re-sort.
/// Cloning shares the underlying log.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemoryEventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, keeping the log sorted by timestamp.
    pub fn append(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            let idx = events.partition_point(|e| e.at <= event.at);
            events.insert(idx, event);
        }
    }

    /// Append a batch of events.
    pub fn append_batch(&self, batch: impl IntoIterator<Item = Event>) {
        for event in batch {
            self.append(event);
        }
    }

    /// Number of events currently in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSource for MemoryEventLog {
    async fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<Event>, StoreError> {
        let events = self.events.lock().map_err(|_| StoreError::Backend {
            message: String::from("event log mutex poisoned"),
        })?;
        Ok(events.iter().filter(|e| e.at >= since).cloned().collect())
    }
}

/// In-memory state store holding the single most-recent snapshot.
///
/// Cloning shares the underlying slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<Option<LifeSystemState>>>,
}

impl MemoryStateStore {
    /// Create an empty store (cold start).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous peek at the stored snapshot, for assertions.
    #[must_use]
    pub fn peek(&self) -> Option<LifeSystemState> {
        self.state.lock().ok().and_then(|s| *s)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<LifeSystemState>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Backend {
            message: String::from("state store mutex poisoned"),
        })?;
        Ok(*state)
    }

    async fn save(&self, state: &LifeSystemState) -> Result<(), StoreError> {
        let mut slot = self.state.lock().map_err(|_| StoreError::Backend {
            message: String::from("state store mutex poisoned"),
        })?;
        *slot = Some(*state);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use attune_types::EventKind;
    use chrono::TimeZone;

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn events_since_filters_by_cursor() {
        let log = MemoryEventLog::new();
        log.append(Event::new(at(0), EventKind::FocusResumed));
        log.append(Event::new(at(10), EventKind::StateUpdated));
        log.append(Event::new(at(20), EventKind::FocusResumed));

        let batch = log.events_since(at(10)).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.first().map(|e| e.at), Some(at(10)));
    }

    #[tokio::test]
    async fn events_come_back_in_ascending_order() {
        let log = MemoryEventLog::new();
        // Inserted out of order on purpose.
        log.append(Event::new(at(20), EventKind::FocusResumed));
        log.append(Event::new(at(5), EventKind::StateUpdated));
        log.append(Event::new(at(12), EventKind::FocusResumed));

        let batch = log.events_since(at(0)).await.unwrap();
        let times: Vec<_> = batch.iter().map(|e| e.at).collect();
        assert_eq!(times, vec![at(5), at(12), at(20)]);
    }

    #[tokio::test]
    async fn state_store_round_trips() {
        let store = MemoryStateStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        let state = LifeSystemState::baseline(at(30));
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(state));
    }
}
