// Deck Configuration

use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::error::{AppError, Result};

/// Gesture commit thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Commit when `|dx|` exceeds this (logical px)
    pub distance_px: f64,
    /// Commit when `|vx|` exceeds this (px/s)
    pub velocity_px_per_s: f64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            distance_px: DEFAULT_DISTANCE_THRESHOLD_PX,
            velocity_px_per_s: DEFAULT_VELOCITY_THRESHOLD_PX_PER_S,
        }
    }
}

/// Deck configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub page_size: usize,
    pub window_size: usize,
    pub prefetch_threshold: usize,
    pub gesture: GestureThresholds,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            gesture: GestureThresholds::default(),
        }
    }
}

impl DeckConfig {
    /// Reject configurations the deck cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(AppError::Config("page_size must be at least 1".to_string()));
        }
        if self.window_size == 0 {
            return Err(AppError::Config(
                "window_size must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("gesture.distance_px", self.gesture.distance_px),
            ("gesture.velocity_px_per_s", self.gesture.velocity_px_per_s),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
