// Deck constants (no magic values)

/// Jobs requested per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Cards rendered in the stack
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Prefetch once this many unconsumed cards (or fewer) remain
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 3;

/// Horizontal travel that commits a swipe (logical px)
pub const DEFAULT_DISTANCE_THRESHOLD_PX: f64 = 100.0;

/// Horizontal release velocity that commits a swipe (px/s)
pub const DEFAULT_VELOCITY_THRESHOLD_PX_PER_S: f64 = 500.0;

/// Opacity lost per step away from the top card
pub const STACK_OPACITY_STEP: f64 = 0.15;

/// Lowest opacity a background card is drawn with
pub const STACK_MIN_OPACITY: f64 = 0.2;

/// Scale lost per step away from the top card
pub const STACK_SCALE_STEP: f64 = 0.05;

/// Smallest scale a background card is drawn with
pub const STACK_MIN_SCALE: f64 = 0.75;

/// Vertical offset per step away from the top card (logical px)
pub const STACK_OFFSET_STEP_PX: f64 = 8.0;

/// Consecutive full pages of already-buffered jobs one prefetch walks past
/// before it gives up on the feed
pub const MAX_DUPLICATE_PAGES: u32 = 16;
