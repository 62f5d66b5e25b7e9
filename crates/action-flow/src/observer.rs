//! Execution event observation

use action_primitives::FailureCategory;
use parking_lot::Mutex;
use serde::Serialize;

/// Notable moments inside command execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    AttemptFailed {
        command: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    RetryScheduled {
        command: String,
        next_attempt: u32,
        delay_ms: u64,
    },
    HealRequested {
        command: String,
        category: FailureCategory,
    },
    Healed {
        command: String,
        selector: String,
        confidence: f64,
    },
    HealFailed {
        command: String,
        reason: String,
    },
    Cancelled {
        command: String,
    },
}

/// Receives execution events; must not block
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn on_event(&self, _event: &ExecutionEvent) {}
}

/// Observer that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ExecutionEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|event| predicate(event)).count()
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&ExecutionEvent::Cancelled {
            command: "click css:#a".to_string(),
        });
        observer.on_event(&ExecutionEvent::HealFailed {
            command: "click css:#a".to_string(),
            reason: "oracle offline".to_string(),
        });

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ExecutionEvent::Cancelled { .. }));
        assert_eq!(
            observer.count(|e| matches!(e, ExecutionEvent::HealFailed { .. })),
            1
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = ExecutionEvent::HealRequested {
            command: "click css:#a".to_string(),
            category: FailureCategory::SelectorNotFound,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "heal_requested");
        assert_eq!(json["category"], "SELECTOR_NOT_FOUND");
    }
}
