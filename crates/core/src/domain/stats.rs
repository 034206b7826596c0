// Swipe Stats & Telemetry Event

use serde::{Deserialize, Serialize};

use crate::domain::{JobId, SwipeDirection};

/// Session counters, one increment per committed swipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeStats {
    pub liked: u64,
    pub passed: u64,
}

impl SwipeStats {
    pub fn record(&mut self, direction: SwipeDirection) {
        match direction {
            SwipeDirection::Right => self.liked += 1,
            SwipeDirection::Left => self.passed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.liked + self.passed
    }
}

/// Payload sent to the swipe telemetry sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeEvent {
    pub job_id: JobId,
    pub direction: SwipeDirection,
    pub session_id: String,
    pub swiped_at_ms: i64, // epoch ms
}
