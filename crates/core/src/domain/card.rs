// Card Domain Model - per-card lifecycle and swipe decisions

use serde::{Deserialize, Serialize};

/// Direction of a committed swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Reject / pass
    Left,
    /// Accept / like
    Right,
}

impl SwipeDirection {
    /// Right iff the horizontal displacement is strictly positive.
    pub fn from_dx(dx: f64) -> Self {
        if dx > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        }
    }

    pub fn is_like(self) -> bool {
        self == SwipeDirection::Right
    }
}

impl std::fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwipeDirection::Left => write!(f, "left"),
            SwipeDirection::Right => write!(f, "right"),
        }
    }
}

/// Card lifecycle
///
/// `Idle -> Dragging -> (Idle | CommittingLeft | CommittingRight) -> Settled`.
/// Explicit controls may jump from `Idle` straight to a committing state.
/// A settled card is destroyed by the rendering layer and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardState {
    Idle,
    Dragging,
    CommittingLeft,
    CommittingRight,
    Settled,
}

impl CardState {
    pub fn committing(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Left => CardState::CommittingLeft,
            SwipeDirection::Right => CardState::CommittingRight,
        }
    }

    /// Direction of the decision, once one has been taken.
    pub fn committed_direction(self) -> Option<SwipeDirection> {
        match self {
            CardState::CommittingLeft => Some(SwipeDirection::Left),
            CardState::CommittingRight => Some(SwipeDirection::Right),
            CardState::Idle | CardState::Dragging | CardState::Settled => None,
        }
    }

    pub fn is_committing(self) -> bool {
        self.committed_direction().is_some()
    }

    /// Committing and settled cards ignore all pointer input.
    pub fn accepts_input(self) -> bool {
        matches!(self, CardState::Idle | CardState::Dragging)
    }
}

impl std::fmt::Display for CardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardState::Idle => write!(f, "IDLE"),
            CardState::Dragging => write!(f, "DRAGGING"),
            CardState::CommittingLeft => write!(f, "COMMITTING_LEFT"),
            CardState::CommittingRight => write!(f, "COMMITTING_RIGHT"),
            CardState::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Discrete result of one gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Commit(SwipeDirection),
    /// Snap back to rest; nothing is reported to the coordinator
    Cancel,
}
