//! Swipe Deck - rendering-layer facade over queue, coordinator and gestures
//!
//! A front end holds one `SwipeDeck`, asks it for the visible window on
//! every render and forwards raw pointer events by card id. The deck keeps
//! one `GestureController` per rendered card and makes sure that only the
//! topmost card can ever report a commit.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::DeckConfig;
use super::coordinator::{CommitOutcome, SwipeCoordinator, SwipeReceipt};
use super::gesture::{GestureController, PointerSample};
use super::queue_store::{QueueSnapshot, QueueStore};
use super::stack_view::StackCard;
use crate::domain::{CardState, GestureOutcome, JobId, JobRecord, SwipeDirection, SwipeStats};
use crate::error::{AppError, Result};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{IdProvider, JobFeed, JobStats, PreferenceSubscription, SwipeTelemetry, TimeProvider};

/// What a pointer release (or explicit pass/like) resolved to
#[derive(Debug)]
pub enum PointerUpOutcome {
    /// No drag in progress on that card
    Ignored,
    /// Below both thresholds; the card snapped back
    Cancelled,
    Committed(SwipeReceipt),
    /// Commit rejected: the card is no longer the top card, or another
    /// decision is still being applied
    Stale { job_id: JobId },
}

impl PointerUpOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, PointerUpOutcome::Committed(_))
    }
}

/// Controllers of the rendered cards, valid for one queue generation
struct CardTable {
    generation: u64,
    controllers: HashMap<JobId, GestureController>,
}

/// Clears the decision lock when the commit path returns
struct DecisionLock<'a>(&'a AtomicBool);

impl Drop for DecisionLock<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SwipeDeck {
    config: DeckConfig,
    feed: Arc<dyn JobFeed>,
    queue: Arc<QueueStore>,
    coordinator: Arc<SwipeCoordinator>,
    cards: Mutex<CardTable>,
    decision_in_flight: AtomicBool,
}

impl SwipeDeck {
    /// Create a deck with the system clock and random session ids
    ///
    /// # Arguments
    /// * `config` - Validated before anything is built
    /// * `feed` - Paginated job source
    /// * `telemetry` - Swipe sink, use `NoopSwipeTelemetry` to disable
    /// * `preferences` - Optional preference-change signal
    pub fn new(
        config: DeckConfig,
        feed: Arc<dyn JobFeed>,
        telemetry: Arc<dyn SwipeTelemetry>,
        preferences: Option<PreferenceSubscription>,
    ) -> Result<Self> {
        Self::with_providers(
            config,
            feed,
            telemetry,
            Arc::new(SystemTimeProvider),
            Arc::new(UuidProvider),
            preferences,
        )
    }

    pub fn with_providers(
        config: DeckConfig,
        feed: Arc<dyn JobFeed>,
        telemetry: Arc<dyn SwipeTelemetry>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        preferences: Option<PreferenceSubscription>,
    ) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(QueueStore::new(Arc::clone(&feed), config.page_size));
        let coordinator = Arc::new(SwipeCoordinator::new(
            Arc::clone(&queue),
            telemetry,
            time_provider,
            id_provider,
            config.prefetch_threshold,
            preferences,
        ));

        Ok(Self {
            config,
            feed,
            queue,
            coordinator,
            cards: Mutex::new(CardTable {
                generation: 0,
                controllers: HashMap::new(),
            }),
            decision_in_flight: AtomicBool::new(false),
        })
    }

    /// Lock the card table, dropping every controller left over from before
    /// the last queue reset (whoever triggered it).
    fn lock_cards(&self) -> MutexGuard<'_, CardTable> {
        let generation = self.queue.generation();
        let mut cards = self.cards.lock().unwrap_or_else(PoisonError::into_inner);
        if cards.generation != generation {
            debug!(
                from = cards.generation,
                to = generation,
                dropped = cards.controllers.len(),
                "Queue was reset; dropping card controllers"
            );
            cards.controllers.clear();
            cards.generation = generation;
        }
        cards
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        self.coordinator.session_id()
    }

    pub fn coordinator(&self) -> &Arc<SwipeCoordinator> {
        &self.coordinator
    }

    /// Load the first page. Card states are dropped once it lands.
    pub async fn load(&self) -> Result<usize> {
        let loaded = self.queue.load_initial().await?;
        self.lock_cards().controllers.clear();
        info!(loaded, session_id = %self.session_id(), "Deck loaded");
        Ok(loaded)
    }

    /// Reset stats and queue, then reload from the first page.
    pub async fn refresh(&self) -> Result<usize> {
        let loaded = self.coordinator.refresh().await?;
        self.lock_cards().controllers.clear();
        Ok(loaded)
    }

    /// Window to render, back-to-front.
    ///
    /// Also syncs the per-card controllers: new cards start idle and cards
    /// that left the window are destroyed unless their exit is still running.
    pub fn visible_window(&self) -> Vec<StackCard> {
        let stack = self.queue.stack(self.config.window_size);
        let visible: HashSet<&str> = stack.iter().map(|card| card.job.id.as_str()).collect();

        let mut cards = self.lock_cards();
        cards.controllers.retain(|id, controller| {
            visible.contains(id.as_str()) || controller.state().is_committing()
        });
        for card in &stack {
            cards
                .controllers
                .entry(card.job.id.clone())
                .or_insert_with(|| GestureController::new(card.job.id.clone(), self.config.gesture));
        }
        stack
    }

    pub fn top_card(&self) -> Option<JobRecord> {
        self.queue.current()
    }

    pub fn is_terminal(&self) -> bool {
        self.coordinator.is_terminal()
    }

    pub fn stats(&self) -> SwipeStats {
        self.coordinator.stats()
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    /// Aggregate catalog counters, straight from the feed
    pub async fn job_stats(&self) -> Result<JobStats> {
        Ok(self.feed.fetch_stats().await?)
    }

    /// State of a rendered card, `None` once it has been destroyed
    pub fn card_state(&self, card_id: &str) -> Option<CardState> {
        self.lock_cards()
            .controllers
            .get(card_id)
            .map(GestureController::state)
    }

    fn is_topmost(&self, card_id: &str) -> bool {
        self.queue.current_id().as_deref() == Some(card_id)
    }

    /// Run `f` on the controller of `card_id`. The top card gets a
    /// controller on demand so that input works before the first render.
    fn with_controller<T>(
        &self,
        card_id: &str,
        f: impl FnOnce(&mut GestureController, bool) -> T,
    ) -> Option<T> {
        let is_topmost = self.is_topmost(card_id);
        let mut cards = self.lock_cards();
        if is_topmost && !cards.controllers.contains_key(card_id) {
            cards.controllers.insert(
                card_id.to_string(),
                GestureController::new(card_id, self.config.gesture),
            );
        }
        cards
            .controllers
            .get_mut(card_id)
            .map(|controller| f(controller, is_topmost))
    }

    pub fn on_pointer_down(&self, card_id: &str, sample: PointerSample) -> bool {
        if self.decision_in_flight.load(Ordering::Acquire) {
            debug!(card_id = %card_id, "Press ignored: decision in flight");
            return false;
        }
        self.with_controller(card_id, |controller, is_topmost| controller.press(sample, is_topmost))
            .unwrap_or(false)
    }

    pub fn on_pointer_move(&self, card_id: &str, sample: PointerSample) -> bool {
        self.with_controller(card_id, |controller, _| controller.drag_to(sample))
            .unwrap_or(false)
    }

    /// Release the drag on `card_id`, with an optional final sample.
    pub fn on_pointer_up(&self, card_id: &str, sample: Option<PointerSample>) -> PointerUpOutcome {
        let outcome = self
            .with_controller(card_id, |controller, _| controller.release(sample))
            .flatten();
        self.resolve(card_id, outcome)
    }

    /// Explicit "not interested" control
    pub fn pass(&self, card_id: &str) -> PointerUpOutcome {
        self.force(card_id, SwipeDirection::Left)
    }

    /// Explicit "interested" control
    pub fn like(&self, card_id: &str) -> PointerUpOutcome {
        self.force(card_id, SwipeDirection::Right)
    }

    fn force(&self, card_id: &str, direction: SwipeDirection) -> PointerUpOutcome {
        let outcome = self
            .with_controller(card_id, |controller, _| controller.force_commit(direction))
            .flatten();
        self.resolve(card_id, outcome)
    }

    fn resolve(&self, card_id: &str, outcome: Option<GestureOutcome>) -> PointerUpOutcome {
        match outcome {
            None => PointerUpOutcome::Ignored,
            Some(GestureOutcome::Cancel) => PointerUpOutcome::Cancelled,
            Some(GestureOutcome::Commit(direction)) => self.commit(card_id, direction),
        }
    }

    fn commit(&self, card_id: &str, direction: SwipeDirection) -> PointerUpOutcome {
        if self
            .decision_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(card_id = %card_id, "Commit rejected: another decision in flight");
            return self.reject(card_id);
        }
        let _lock = DecisionLock(&self.decision_in_flight);

        if !self.is_topmost(card_id) {
            warn!(card_id = %card_id, direction = %direction, "Commit rejected: card is not topmost");
            return self.reject(card_id);
        }

        match self.coordinator.on_commit(card_id, direction) {
            CommitOutcome::Recorded(receipt) => PointerUpOutcome::Committed(receipt),
            CommitOutcome::Ignored { .. } => self.reject(card_id),
        }
    }

    fn reject(&self, card_id: &str) -> PointerUpOutcome {
        if let Some(controller) = self.lock_cards().controllers.get_mut(card_id) {
            controller.revert_to_idle();
        }
        PointerUpOutcome::Stale {
            job_id: card_id.to_string(),
        }
    }

    /// Exit transition of `card_id` finished; destroy its controller.
    pub fn on_exit_complete(&self, card_id: &str) -> Result<()> {
        let mut cards = self.lock_cards();
        let controller = cards
            .controllers
            .get_mut(card_id)
            .ok_or_else(|| AppError::StaleEvent(format!("no rendered card {}", card_id)))?;
        controller.finish_exit()?;
        cards.controllers.remove(card_id);
        debug!(card_id = %card_id, "Card destroyed");
        Ok(())
    }

    /// See `SwipeCoordinator::spawn_preference_listener`
    pub fn spawn_preference_listener(&self) -> Option<JoinHandle<()>> {
        self.coordinator.spawn_preference_listener()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::job_feed::mocks::MockJobFeed;
    use crate::port::swipe_telemetry::mocks::RecordingTelemetry;
    use crate::port::time_provider::FixedTimeProvider;
    use crate::port::{preference_channel, FeedError, NoopSwipeTelemetry};

    fn deck_with(feed: MockJobFeed, telemetry: Arc<dyn SwipeTelemetry>) -> SwipeDeck {
        SwipeDeck::with_providers(
            DeckConfig::default(),
            Arc::new(feed),
            telemetry,
            Arc::new(FixedTimeProvider(1_000)),
            Arc::new(SequentialIdProvider::new("session")),
            None,
        )
        .unwrap()
    }

    async fn loaded_deck(total: usize) -> SwipeDeck {
        let deck = deck_with(MockJobFeed::with_catalog(total), Arc::new(NoopSwipeTelemetry));
        deck.load().await.unwrap();
        deck
    }

    fn drag(deck: &SwipeDeck, card_id: &str, dx: f64, ms: i64) -> PointerUpOutcome {
        assert!(deck.on_pointer_down(card_id, PointerSample::new(0.0, 0.0, 0)));
        deck.on_pointer_move(card_id, PointerSample::new(dx / 2.0, 0.0, ms / 2));
        deck.on_pointer_up(card_id, Some(PointerSample::new(dx, 0.0, ms)))
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DeckConfig {
            window_size: 0,
            ..DeckConfig::default()
        };
        let result = SwipeDeck::new(
            config,
            Arc::new(MockJobFeed::with_catalog(1)),
            Arc::new(NoopSwipeTelemetry),
            None,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_visible_window_registers_idle_cards() {
        let deck = loaded_deck(30).await;
        let window = deck.visible_window();

        assert_eq!(window.len(), 5);
        assert_eq!(window.last().unwrap().job.id, "job-1");
        for card in &window {
            assert_eq!(deck.card_state(&card.job.id), Some(CardState::Idle));
        }
        assert_eq!(deck.card_state("job-6"), None);
    }

    #[tokio::test]
    async fn test_drag_past_threshold_commits_and_advances() {
        let telemetry = Arc::new(RecordingTelemetry::new());
        let deck = deck_with(MockJobFeed::with_catalog(30), telemetry.clone());
        deck.load().await.unwrap();
        deck.visible_window();

        let outcome = drag(&deck, "job-1", 150.0, 1000);
        let receipt = match outcome {
            PointerUpOutcome::Committed(receipt) => receipt,
            other => panic!("expected commit, got {:?}", other),
        };
        assert_eq!(receipt.direction, SwipeDirection::Right);
        assert_eq!(receipt.cursor, 1);
        if let Some(handle) = receipt.telemetry {
            handle.await.unwrap();
        }

        assert_eq!(deck.card_state("job-1"), Some(CardState::CommittingRight));
        assert_eq!(deck.top_card().unwrap().id, "job-2");
        assert_eq!(deck.stats().liked, 1);
        assert_eq!(telemetry.events()[0].session_id, "session-1");
    }

    #[tokio::test]
    async fn test_short_drag_snaps_back() {
        let deck = loaded_deck(30).await;
        let outcome = drag(&deck, "job-1", 40.0, 1000);

        assert!(matches!(outcome, PointerUpOutcome::Cancelled));
        assert_eq!(deck.card_state("job-1"), Some(CardState::Idle));
        assert_eq!(deck.queue_snapshot().cursor, 0);
        assert_eq!(deck.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_second_release_after_commit_is_ignored() {
        let deck = loaded_deck(30).await;
        assert!(drag(&deck, "job-1", -200.0, 1000).is_committed());

        let again = deck.on_pointer_up("job-1", Some(PointerSample::new(-300.0, 0.0, 1100)));
        assert!(matches!(again, PointerUpOutcome::Ignored));
        assert!(matches!(deck.pass("job-1"), PointerUpOutcome::Ignored));
        assert_eq!(deck.stats().passed, 1);
        assert_eq!(deck.queue_snapshot().cursor, 1);
    }

    #[tokio::test]
    async fn test_background_card_cannot_be_pressed() {
        let deck = loaded_deck(30).await;
        deck.visible_window();

        assert!(!deck.on_pointer_down("job-3", PointerSample::new(0.0, 0.0, 0)));
        assert!(matches!(deck.like("job-3"), PointerUpOutcome::Stale { .. }));
        assert_eq!(deck.card_state("job-3"), Some(CardState::Idle));
        assert_eq!(deck.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_commit_on_consumed_card_is_stale() {
        let deck = loaded_deck(30).await;
        deck.visible_window();

        // Start a drag on the top card, then consume it through the button
        assert!(deck.on_pointer_down("job-1", PointerSample::new(0.0, 0.0, 0)));
        let mut shadow = deck.lock_cards().controllers.get("job-1").cloned().unwrap();
        assert!(deck.like("job-1").is_committed());

        // A controller that missed the commit reports one anyway
        shadow.drag_to(PointerSample::new(300.0, 0.0, 100));
        deck.lock_cards()
            .controllers
            .insert("job-1".to_string(), shadow);
        let outcome = deck.on_pointer_up("job-1", None);

        assert!(matches!(outcome, PointerUpOutcome::Stale { ref job_id } if job_id == "job-1"));
        assert_eq!(deck.stats().liked, 1);
        assert_eq!(deck.queue_snapshot().cursor, 1);
    }

    #[tokio::test]
    async fn test_press_rejected_while_decision_in_flight() {
        let deck = loaded_deck(30).await;
        deck.decision_in_flight.store(true, Ordering::Release);

        assert!(!deck.on_pointer_down("job-1", PointerSample::new(0.0, 0.0, 0)));
        assert!(matches!(deck.like("job-1"), PointerUpOutcome::Stale { .. }));
        assert_eq!(deck.card_state("job-1"), Some(CardState::Idle));

        deck.decision_in_flight.store(false, Ordering::Release);
        assert!(deck.like("job-1").is_committed());
    }

    #[tokio::test]
    async fn test_exit_complete_destroys_card() {
        let deck = loaded_deck(30).await;
        deck.visible_window();
        assert!(deck.pass("job-1").is_committed());

        // Still rendered while the exit runs, even though it left the window
        deck.visible_window();
        assert_eq!(deck.card_state("job-1"), Some(CardState::CommittingLeft));

        deck.on_exit_complete("job-1").unwrap();
        assert_eq!(deck.card_state("job-1"), None);
        assert!(matches!(
            deck.on_exit_complete("job-1"),
            Err(AppError::StaleEvent(_))
        ));
    }

    #[tokio::test]
    async fn test_exit_complete_before_commit_fails() {
        let deck = loaded_deck(30).await;
        deck.visible_window();
        assert!(matches!(
            deck.on_exit_complete("job-1"),
            Err(AppError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_terminal_after_single_short_page() {
        let deck = loaded_deck(3).await;
        assert!(!deck.is_terminal());

        for id in ["job-1", "job-2", "job-3"] {
            assert!(deck.like(id).is_committed());
        }
        assert!(deck.is_terminal());
        assert!(deck.visible_window().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_deck_empty() {
        let feed = MockJobFeed::with_catalog(10);
        feed.fail_next(FeedError::Http { status: 503 });
        let deck = deck_with(feed, Arc::new(NoopSwipeTelemetry));

        let err = deck.load().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(deck.visible_window().is_empty());

        assert_eq!(deck.load().await.unwrap(), 10);
        assert_eq!(deck.visible_window().len(), 5);
    }

    #[tokio::test]
    async fn test_refresh_resets_stats_and_cards() {
        let deck = loaded_deck(30).await;
        deck.visible_window();
        deck.like("job-1");
        deck.pass("job-2");

        assert_eq!(deck.refresh().await.unwrap(), 20);
        assert_eq!(deck.stats(), SwipeStats::default());
        assert_eq!(deck.card_state("job-1"), None);
        assert_eq!(deck.top_card().unwrap().id, "job-1");
    }

    #[tokio::test]
    async fn test_preference_change_reloads_deck() {
        let (notifier, subscription) = preference_channel();
        let deck = SwipeDeck::with_providers(
            DeckConfig::default(),
            Arc::new(MockJobFeed::with_catalog(30)),
            Arc::new(NoopSwipeTelemetry),
            Arc::new(FixedTimeProvider(1_000)),
            Arc::new(SequentialIdProvider::new("session")),
            Some(subscription),
        )
        .unwrap();
        deck.load().await.unwrap();
        assert!(deck.like("job-1").is_committed());
        assert_eq!(deck.card_state("job-1"), Some(CardState::CommittingRight));

        let listener = deck.spawn_preference_listener().unwrap();
        assert!(deck.spawn_preference_listener().is_none());

        notifier.notify();
        drop(notifier);
        listener.await.unwrap();

        assert_eq!(deck.stats().total(), 0);
        assert_eq!(deck.queue_snapshot().cursor, 0);

        // The reload came from the listener, not from `SwipeDeck::refresh`,
        // so the committing controller of job-1 must not survive it
        deck.visible_window();
        assert_eq!(deck.card_state("job-1"), Some(CardState::Idle));
        assert!(deck.like("job-1").is_committed());
        assert_eq!(deck.stats().liked, 1);
    }

    #[tokio::test]
    async fn test_job_stats_passthrough() {
        let deck = loaded_deck(42).await;
        let stats = deck.job_stats().await.unwrap();
        assert_eq!(stats.total_jobs, 42);
    }
}
