//! Gesture Controller - per-card drag state machine
//!
//! Turns a continuous pointer trajectory into one discrete outcome per
//! gesture: commit left, commit right, or cancel (snap back). Once a commit
//! is taken the card ignores every further input until it is destroyed.

use tracing::debug;

use super::config::GestureThresholds;
use crate::domain::error::{DomainError, Result};
use crate::domain::{CardState, GestureOutcome, JobId, SwipeDirection};

/// One pointer/touch sample in logical px
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    /// Sample time in ms (any monotonic clock)
    pub at_ms: i64,
}

impl PointerSample {
    pub fn new(x: f64, y: f64, at_ms: i64) -> Self {
        Self { x, y, at_ms }
    }
}

/// Drag state for one rendered card
#[derive(Debug, Clone)]
pub struct GestureController {
    card_id: JobId,
    state: CardState,
    thresholds: GestureThresholds,
    origin: Option<PointerSample>,
    last: Option<PointerSample>,
    dx: f64,
    dy: f64,
    vx: f64,
}

impl GestureController {
    pub fn new(card_id: impl Into<String>, thresholds: GestureThresholds) -> Self {
        Self {
            card_id: card_id.into(),
            state: CardState::Idle,
            thresholds,
            origin: None,
            last: None,
            dx: 0.0,
            dy: 0.0,
            vx: 0.0,
        }
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    /// Current displacement from the press point
    pub fn offset(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Latest horizontal velocity in px/s
    pub fn velocity_x(&self) -> f64 {
        self.vx
    }

    /// Start a drag. Only an idle, topmost card can be picked up.
    pub fn press(&mut self, sample: PointerSample, is_topmost: bool) -> bool {
        if self.state != CardState::Idle {
            debug!(card_id = %self.card_id, state = %self.state, "Press ignored");
            return false;
        }
        if !is_topmost {
            debug!(card_id = %self.card_id, "Press ignored: card is not topmost");
            return false;
        }

        self.state = CardState::Dragging;
        self.origin = Some(sample);
        self.last = Some(sample);
        self.dx = 0.0;
        self.dy = 0.0;
        self.vx = 0.0;
        debug!(card_id = %self.card_id, "Drag started");
        true
    }

    /// Track pointer movement while dragging.
    pub fn drag_to(&mut self, sample: PointerSample) -> bool {
        if self.state != CardState::Dragging {
            return false;
        }
        let (Some(origin), Some(last)) = (self.origin, self.last) else {
            return false;
        };

        self.dx = sample.x - origin.x;
        self.dy = sample.y - origin.y;

        // Zero-duration samples cannot yield a velocity; keep the previous one
        let dt_ms = sample.at_ms - last.at_ms;
        if dt_ms > 0 {
            self.vx = (sample.x - last.x) * 1000.0 / dt_ms as f64;
        }
        self.last = Some(sample);
        true
    }

    /// End the drag and resolve it.
    ///
    /// Returns `None` when no drag is in progress, which makes repeated
    /// release events harmless.
    pub fn release(&mut self, sample: Option<PointerSample>) -> Option<GestureOutcome> {
        if self.state != CardState::Dragging {
            debug!(card_id = %self.card_id, state = %self.state, "Release ignored");
            return None;
        }
        if let Some(sample) = sample {
            self.drag_to(sample);
        }

        let past_distance = self.dx.abs() > self.thresholds.distance_px;
        let past_velocity = self.vx.abs() > self.thresholds.velocity_px_per_s;

        if past_distance || past_velocity {
            let direction = SwipeDirection::from_dx(self.dx);
            self.state = CardState::committing(direction);
            debug!(
                card_id = %self.card_id,
                dx = self.dx,
                vx = self.vx,
                direction = %direction,
                "Swipe committed"
            );
            Some(GestureOutcome::Commit(direction))
        } else {
            debug!(card_id = %self.card_id, dx = self.dx, vx = self.vx, "Snap back");
            self.snap_back();
            Some(GestureOutcome::Cancel)
        }
    }

    /// Commit from an explicit pass/like control.
    pub fn force_commit(&mut self, direction: SwipeDirection) -> Option<GestureOutcome> {
        if !self.state.accepts_input() {
            debug!(card_id = %self.card_id, state = %self.state, "Explicit commit ignored");
            return None;
        }
        self.state = CardState::committing(direction);
        debug!(card_id = %self.card_id, direction = %direction, "Explicit commit");
        Some(GestureOutcome::Commit(direction))
    }

    /// Exit transition finished; the card can be destroyed.
    pub fn finish_exit(&mut self) -> Result<()> {
        if !self.state.is_committing() {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: CardState::Settled.to_string(),
            });
        }
        self.state = CardState::Settled;
        Ok(())
    }

    /// Put an un-committed card back at rest (commit rejected upstream).
    pub(crate) fn revert_to_idle(&mut self) {
        if self.state != CardState::Settled {
            self.snap_back();
        }
    }

    fn snap_back(&mut self) {
        self.state = CardState::Idle;
        self.origin = None;
        self.last = None;
        self.dx = 0.0;
        self.dy = 0.0;
        self.vx = 0.0;
    }
}
