//! Stack View - pure derivation of the rendered card window
//!
//! Nothing here holds state: the window and every card's composite
//! attributes are recomputed from `(items, cursor)` on each render.

use super::constants::*;
use crate::domain::JobRecord;

/// Static composite attributes of one rendered card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayer {
    /// Distance from the top card (0 = topmost)
    pub depth: usize,
    /// Paint order, higher is drawn later
    pub z_index: usize,
    pub opacity: f64,
    pub scale: f64,
    /// Downward offset in logical px
    pub offset_y: f64,
    /// Only the topmost card takes pointer input
    pub interactive: bool,
}

/// One card of the rendered stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackCard {
    pub job: JobRecord,
    pub layer: CardLayer,
}

/// `items[cursor .. cursor + window_size)`, ordered back-to-front.
///
/// Index 0 is the back-most card and the last element is the topmost,
/// interactive card. An empty result means the deck has no cards left to
/// show.
pub fn compute_window(items: &[JobRecord], cursor: usize, window_size: usize) -> Vec<JobRecord> {
    if cursor >= items.len() {
        return Vec::new();
    }
    let end = cursor.saturating_add(window_size).min(items.len());
    items[cursor..end].iter().rev().cloned().collect()
}

/// Composite attributes for the card at `index` of a window of `window_len`
/// cards (index 0 = back-most).
pub fn layer_for(index: usize, window_len: usize) -> CardLayer {
    let depth = window_len.saturating_sub(index + 1);
    let steps = depth as f64;

    CardLayer {
        depth,
        z_index: index,
        opacity: (1.0 - STACK_OPACITY_STEP * steps).max(STACK_MIN_OPACITY),
        scale: (1.0 - STACK_SCALE_STEP * steps).max(STACK_MIN_SCALE),
        offset_y: STACK_OFFSET_STEP_PX * steps,
        interactive: depth == 0,
    }
}

/// Window plus composite attributes, back-to-front
pub fn build_stack(items: &[JobRecord], cursor: usize, window_size: usize) -> Vec<StackCard> {
    let window = compute_window(items, cursor, window_size);
    let window_len = window.len();
    window
        .into_iter()
        .enumerate()
        .map(|(index, job)| StackCard {
            job,
            layer: layer_for(index, window_len),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::job_feed::mocks::catalog;

    #[test]
    fn test_window_slices_tail_back_to_front() {
        let items = catalog(0, 11); // 12 items: job-0 ..= job-11
        let window = compute_window(&items, 8, 5);

        let ids: Vec<&str> = window.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-11", "job-10", "job-9", "job-8"]);
    }

    #[test]
    fn test_window_full_size_in_middle_of_deck() {
        let items = catalog(1, 20);
        let window = compute_window(&items, 3, 5);

        assert_eq!(window.len(), 5);
        assert_eq!(window.first().unwrap().id, "job-8");
        assert_eq!(window.last().unwrap().id, "job-4");
    }

    #[test]
    fn test_window_empty_when_cursor_at_end() {
        let items = catalog(1, 3);
        assert!(compute_window(&items, 3, 5).is_empty());
        assert!(compute_window(&items, 10, 5).is_empty());
        assert!(compute_window(&[], 0, 5).is_empty());
    }

    #[test]
    fn test_layers_decrease_away_from_top() {
        let layers: Vec<CardLayer> = (0..5).map(|i| layer_for(i, 5)).collect();

        let top = layers[4];
        assert_eq!(top.depth, 0);
        assert!(top.interactive);
        assert_eq!(top.opacity, 1.0);
        assert_eq!(top.scale, 1.0);
        assert_eq!(top.offset_y, 0.0);

        for pair in layers.windows(2) {
            let (back, front) = (pair[0], pair[1]);
            assert!(back.opacity < front.opacity);
            assert!(back.scale < front.scale);
            assert!(back.z_index < front.z_index);
            assert!(!back.interactive);
        }
    }

    #[test]
    fn test_layers_are_deterministic() {
        assert_eq!(layer_for(2, 5), layer_for(2, 5));
        // Same depth gives the same weight regardless of window length
        assert_eq!(layer_for(0, 3).opacity, layer_for(2, 5).opacity);
    }

    #[test]
    fn test_deep_layers_clamp_to_floor() {
        let layer = layer_for(0, 50);
        assert_eq!(layer.opacity, STACK_MIN_OPACITY);
        assert_eq!(layer.scale, STACK_MIN_SCALE);
    }

    #[test]
    fn test_build_stack_marks_single_interactive_card() {
        let items = catalog(1, 10);
        let stack = build_stack(&items, 0, 5);

        assert_eq!(stack.len(), 5);
        assert_eq!(stack.iter().filter(|c| c.layer.interactive).count(), 1);
        assert_eq!(stack.last().unwrap().job.id, "job-1");
        assert!(stack.last().unwrap().layer.interactive);
    }
}
