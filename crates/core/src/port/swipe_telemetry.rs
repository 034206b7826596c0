// Swipe Telemetry Port
// Fire-and-forget sink for committed swipes; failures never block the deck

use crate::domain::SwipeEvent;
use async_trait::async_trait;
use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status}")]
    Http { status: u16 },
}

/// Swipe telemetry sink
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwipeTelemetry: Send + Sync {
    /// Record one committed swipe
    async fn record_swipe(&self, event: &SwipeEvent) -> Result<(), TelemetryError>;
}

/// Sink that drops every event (sessions without a telemetry endpoint)
pub struct NoopSwipeTelemetry;

#[async_trait]
impl SwipeTelemetry for NoopSwipeTelemetry {
    async fn record_swipe(&self, _event: &SwipeEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records every event; optionally fails after recording
    #[derive(Default)]
    pub struct RecordingTelemetry {
        events: Mutex<Vec<SwipeEvent>>,
        failing: AtomicBool,
    }

    impl RecordingTelemetry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn new_failing() -> Self {
            let telemetry = Self::default();
            telemetry.set_failing(true);
            telemetry
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn events(&self) -> Vec<SwipeEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SwipeTelemetry for RecordingTelemetry {
        async fn record_swipe(&self, event: &SwipeEvent) -> Result<(), TelemetryError> {
            self.events.lock().unwrap().push(event.clone());
            if self.failing.load(Ordering::SeqCst) {
                return Err(TelemetryError::Transport("telemetry sink offline".to_string()));
            }
            Ok(())
        }
    }
}
