//! Event Log Module
//!
//! Append-only, bounded log of lifecycle transitions with ring-buffer
//! semantics: once the bound is exceeded the oldest records are dropped.
//! Subscribers receive live events through a broadcast channel; the ring
//! serves catch-up reads.

use conductor_shared::types::{EventRecord, OrchestratorEvent};
use parking_lot::RwLock;
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tracing::debug;

/// Bounded lifecycle event log with broadcast fan-out
#[derive(Debug)]
pub struct EventLog {
    ring: RwLock<VecDeque<EventRecord>>,
    sender: broadcast::Sender<EventRecord>,
    capacity: usize,
}

impl EventLog {
    /// Create an event log holding at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(16));
        Self {
            ring: RwLock::new(VecDeque::with_capacity(capacity)),
            sender,
            capacity,
        }
    }

    /// Append an event, evicting the oldest record when full, and fan it
    /// out to subscribers
    pub fn emit(&self, event: OrchestratorEvent) -> EventRecord {
        let record = EventRecord::new(event);
        debug!(event_id = %record.id, "Event emitted");

        {
            let mut ring = self.ring.write();
            if ring.len() == self.capacity {
                ring.pop_front();
            }
            ring.push_back(record.clone());
        }

        // A send error only means there are no live subscribers.
        let _ = self.sender.send(record.clone());
        record
    }

    /// Most recent events, oldest first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<EventRecord> {
        let ring = self.ring.read();
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    /// Subscribe to live events; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_shared::types::{ProviderStatus, WorkflowStatus};
    use uuid::Uuid;

    fn status_event() -> OrchestratorEvent {
        OrchestratorEvent::ProviderStatusChanged {
            provider_id: Uuid::new_v4(),
            from: ProviderStatus::Disconnected,
            to: ProviderStatus::Connecting,
        }
    }

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let log = EventLog::new(3);
        let first = log.emit(status_event());
        for _ in 0..3 {
            log.emit(status_event());
        }
        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert!(recent.iter().all(|r| r.id != first.id));
    }

    #[test]
    fn recent_returns_oldest_first() {
        let log = EventLog::new(8);
        let a = log.emit(status_event());
        let b = log.emit(status_event());
        let recent = log.recent(2);
        assert_eq!(recent[0].id, a.id);
        assert_eq!(recent[1].id, b.id);
    }

    #[tokio::test]
    async fn subscribers_receive_live_events() {
        let log = EventLog::new(8);
        let mut rx = log.subscribe();
        let emitted = log.emit(OrchestratorEvent::WorkflowStatusChanged {
            workflow_id: Uuid::new_v4(),
            from: WorkflowStatus::Draft,
            to: WorkflowStatus::Running,
        });
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, emitted.id);
    }
}
