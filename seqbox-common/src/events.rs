//! Event types for the seqbox event system
//!
//! The player emits progress and state-change notifications through an
//! [`EventBus`] (tokio broadcast). The controlling context subscribes and
//! renders them; the run task never touches presentation directly.
//!
//! Notifications are emitted in the same order commands are sent; the bus
//! never reorders or batches.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Seqbox player event types
///
/// Events are broadcast via [`EventBus`] and can be serialized for external
/// observers. `Progress` is emitted BEFORE the corresponding channel write,
/// so listeners see intent even when the write subsequently fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A run started
    Started {
        /// Identifier of this run
        run_id: Uuid,
        /// Number of schedule entries in the run
        entries: usize,
        /// When the run started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// About to send a scheduled command
    Progress {
        /// Identifier of this run
        run_id: Uuid,
        /// Zero-based index of the entry in the schedule
        index: usize,
        /// Scheduled offset of the entry, minutes since run start
        scheduled_offset_minutes: f64,
        /// Command payload (lossy UTF-8 for display)
        command: String,
        /// Wall-clock time of the send
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run paused; the current entry index is preserved
    Paused {
        run_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run resumed from pause
    Resumed {
        run_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run stopped by explicit request
    Stopped {
        run_id: Uuid,
        /// Commands sent before the stop was observed
        commands_sent: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run completed the whole schedule
    Finished {
        run_id: Uuid,
        /// Commands sent (equals the schedule length)
        commands_sent: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run terminated by a channel failure
    ///
    /// Distinct from `Finished`/`Stopped` so the controlling layer can reset
    /// affected controls and alert the operator.
    Failed {
        run_id: Uuid,
        /// Why the run failed
        reason: String,
        /// Commands sent before the failure
        commands_sent: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A control call was rejected in the current state
    InvalidTransition {
        /// Requested operation (`start`, `pause`, `resume`)
        requested: String,
        /// Player state at the time of the call
        state: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            PlayerEvent::Started { .. } => "Started",
            PlayerEvent::Progress { .. } => "Progress",
            PlayerEvent::Paused { .. } => "Paused",
            PlayerEvent::Resumed { .. } => "Resumed",
            PlayerEvent::Stopped { .. } => "Stopped",
            PlayerEvent::Finished { .. } => "Finished",
            PlayerEvent::Failed { .. } => "Failed",
            PlayerEvent::InvalidTransition { .. } => "InvalidTransition",
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper over tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block the run task)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn progress_event(index: usize) -> PlayerEvent {
        PlayerEvent::Progress {
            run_id: Uuid::new_v4(),
            index,
            scheduled_offset_minutes: index as f64,
            command: "A".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        assert!(bus.emit(progress_event(0)).is_err());
    }

    #[test]
    fn test_eventbus_emit_lossy_does_not_panic() {
        let bus = EventBus::new(2);
        let mut _rx = bus.subscribe(); // subscribe but never receive

        for i in 0..10 {
            bus.emit_lossy(progress_event(i));
        }
        assert_eq!(bus.capacity(), 2);
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = Arc::new(EventBus::new(100));
        let mut rx = bus.subscribe();

        let run_id = Uuid::new_v4();
        bus.emit(PlayerEvent::Started {
            run_id,
            entries: 3,
            timestamp: chrono::Utc::now(),
        })
        .expect("emit should succeed");

        let received = rx.recv().await.expect("should receive event");
        match received {
            PlayerEvent::Started {
                run_id: received_id,
                entries,
                ..
            } => {
                assert_eq!(received_id, run_id);
                assert_eq!(entries, 3);
            }
            other => panic!("wrong event type: {:?}", other),
        }
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(progress_event(0)).expect("emit should succeed");

        assert_eq!(rx1.try_recv().expect("rx1").event_type(), "Progress");
        assert_eq!(rx2.try_recv().expect("rx2").event_type(), "Progress");
    }

    #[test]
    fn test_event_type_method() {
        let now = chrono::Utc::now();
        let run_id = Uuid::new_v4();
        let events = vec![
            (
                PlayerEvent::Started {
                    run_id,
                    entries: 1,
                    timestamp: now,
                },
                "Started",
            ),
            (progress_event(0), "Progress"),
            (
                PlayerEvent::Paused {
                    run_id,
                    timestamp: now,
                },
                "Paused",
            ),
            (
                PlayerEvent::Stopped {
                    run_id,
                    commands_sent: 1,
                    timestamp: now,
                },
                "Stopped",
            ),
            (
                PlayerEvent::Failed {
                    run_id,
                    reason: "serial write failed".to_string(),
                    commands_sent: 1,
                    timestamp: now,
                },
                "Failed",
            ),
            (
                PlayerEvent::InvalidTransition {
                    requested: "start".to_string(),
                    state: "running".to_string(),
                    timestamp: now,
                },
                "InvalidTransition",
            ),
        ];

        for (event, expected_type) in events {
            assert_eq!(event.event_type(), expected_type);
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = PlayerEvent::Progress {
            run_id: Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc),
            index: 2,
            scheduled_offset_minutes: 1.5,
            command: "B".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).expect("serialization should succeed");
        assert!(json.contains("\"type\":\"Progress\""));
        assert!(json.contains("\"scheduled_offset_minutes\":1.5"));
        assert!(json.contains("\"command\":\"B\""));

        let deserialized: PlayerEvent =
            serde_json::from_str(&json).expect("deserialization should succeed");
        match deserialized {
            PlayerEvent::Progress { index, command, .. } => {
                assert_eq!(index, 2);
                assert_eq!(command, "B");
            }
            other => panic!("wrong event type: {:?}", other),
        }
    }
}
