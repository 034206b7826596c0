//! Swipe Coordinator - the only writer of the cursor and the swipe stats
//!
//! Bridges gesture commits to the queue: advances the cursor, counts the
//! decision, triggers prefetch when the buffer runs low and reports the
//! swipe to telemetry. Prefetch and telemetry run detached; the deck never
//! waits on them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::queue_store::{PrefetchOutcome, QueueStore};
use super::spawn::spawn_detached;
use crate::domain::{JobId, SwipeDirection, SwipeEvent, SwipeStats};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, PreferenceSubscription, SwipeTelemetry, TimeProvider};

/// Everything that happened because of one recorded swipe
#[derive(Debug)]
pub struct SwipeReceipt {
    pub job_id: JobId,
    pub direction: SwipeDirection,
    /// Cursor after the advance
    pub cursor: usize,
    /// Unconsumed cards left in the buffer
    pub remaining: usize,
    /// Counters after this swipe
    pub stats: SwipeStats,
    /// Present when this swipe triggered a prefetch
    pub prefetch: Option<JoinHandle<PrefetchOutcome>>,
    pub telemetry: Option<JoinHandle<()>>,
}

impl SwipeReceipt {
    pub fn prefetch_triggered(&self) -> bool {
        self.prefetch.is_some()
    }
}

/// Result of `on_commit`
#[derive(Debug)]
pub enum CommitOutcome {
    Recorded(SwipeReceipt),
    /// Commit referenced a card that is not the current top card
    Ignored { job_id: JobId, reason: String },
}

impl CommitOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, CommitOutcome::Recorded(_))
    }

    pub fn into_receipt(self) -> Option<SwipeReceipt> {
        match self {
            CommitOutcome::Recorded(receipt) => Some(receipt),
            CommitOutcome::Ignored { .. } => None,
        }
    }
}

pub struct SwipeCoordinator {
    queue: Arc<QueueStore>,
    telemetry: Arc<dyn SwipeTelemetry>,
    time_provider: Arc<dyn TimeProvider>,
    session_id: String,
    prefetch_threshold: usize,
    stats: Mutex<SwipeStats>,
    preferences: Mutex<Option<PreferenceSubscription>>,
}

impl SwipeCoordinator {
    /// Create a coordinator
    ///
    /// # Arguments
    /// * `queue` - Queue whose cursor this coordinator advances
    /// * `telemetry` - Sink for recorded swipes
    /// * `time_provider` - Clock for swipe timestamps
    /// * `id_provider` - Generates the telemetry session id
    /// * `prefetch_threshold` - Prefetch once this many cards or fewer remain
    /// * `preferences` - Preference-change signal, consumed by
    ///   `spawn_preference_listener`
    pub fn new(
        queue: Arc<QueueStore>,
        telemetry: Arc<dyn SwipeTelemetry>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        prefetch_threshold: usize,
        preferences: Option<PreferenceSubscription>,
    ) -> Self {
        Self {
            queue,
            telemetry,
            time_provider,
            session_id: id_provider.generate_id(),
            prefetch_threshold,
            stats: Mutex::new(SwipeStats::default()),
            preferences: Mutex::new(preferences),
        }
    }

    fn lock_stats(&self) -> MutexGuard<'_, SwipeStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn stats(&self) -> SwipeStats {
        *self.lock_stats()
    }

    /// Deck is exhausted: no card left and nothing more to fetch
    pub fn is_terminal(&self) -> bool {
        self.queue.is_exhausted()
    }

    /// Record a committed swipe on `job_id`.
    ///
    /// Must run inside a Tokio runtime for prefetch and telemetry to be
    /// dispatched; without one they are skipped and the swipe still counts.
    pub fn on_commit(&self, job_id: &str, direction: SwipeDirection) -> CommitOutcome {
        let advance = match self.queue.advance_cursor(job_id) {
            Ok(advance) => advance,
            Err(e) => {
                warn!(job_id = %job_id, direction = %direction, error = %e, "Ignoring stale commit");
                return CommitOutcome::Ignored {
                    job_id: job_id.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let stats = {
            let mut stats = self.lock_stats();
            stats.record(direction);
            *stats
        };

        info!(
            job_id = %job_id,
            direction = %direction,
            cursor = advance.cursor,
            remaining = advance.remaining,
            liked = stats.liked,
            passed = stats.passed,
            "Swipe recorded"
        );

        let prefetch = if advance.remaining <= self.prefetch_threshold && advance.has_more {
            debug!(remaining = advance.remaining, "Buffer low; prefetching");
            let queue = Arc::clone(&self.queue);
            spawn_detached("prefetch", async move { queue.prefetch_next().await })
        } else {
            None
        };

        let event = SwipeEvent {
            job_id: job_id.to_string(),
            direction,
            session_id: self.session_id.clone(),
            swiped_at_ms: self.time_provider.now_millis(),
        };
        let telemetry = Arc::clone(&self.telemetry);
        let telemetry = spawn_detached("swipe_telemetry", async move {
            if let Err(e) = telemetry.record_swipe(&event).await {
                warn!(
                    job_id = %event.job_id,
                    error = %AppError::from(e),
                    "Failed to record swipe (ignored)"
                );
            }
        });

        CommitOutcome::Recorded(SwipeReceipt {
            job_id: job_id.to_string(),
            direction,
            cursor: advance.cursor,
            remaining: advance.remaining,
            stats,
            prefetch,
            telemetry,
        })
    }

    /// Zero the counters and reload the deck from the first page.
    pub async fn refresh(&self) -> Result<usize> {
        *self.lock_stats() = SwipeStats::default();
        info!(session_id = %self.session_id, "Refreshing deck");
        self.queue.reset().await
    }

    /// Refresh the deck on every preference change.
    ///
    /// Consumes the subscription given at construction; returns `None` when
    /// there is none (or it was already consumed) or no runtime is running.
    pub fn spawn_preference_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut subscription = self
            .preferences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let coordinator = Arc::clone(self);

        spawn_detached("preference_listener", async move {
            while subscription.changed().await {
                info!(version = subscription.version(), "Preferences changed");
                match coordinator.refresh().await {
                    Ok(loaded) => info!(loaded, "Deck reloaded after preference change"),
                    Err(e) => error!(error = %e, "Deck reload after preference change failed"),
                }
            }
            debug!("Preference signal closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::job_feed::mocks::MockJobFeed;
    use crate::port::preference_channel;
    use crate::port::swipe_telemetry::mocks::RecordingTelemetry;
    use crate::port::swipe_telemetry::MockSwipeTelemetry;
    use crate::port::time_provider::FixedTimeProvider;

    struct Fixture {
        feed: Arc<MockJobFeed>,
        queue: Arc<QueueStore>,
        coordinator: Arc<SwipeCoordinator>,
    }

    async fn fixture(feed: MockJobFeed, telemetry: Arc<dyn SwipeTelemetry>) -> Fixture {
        let feed = Arc::new(feed);
        let queue = Arc::new(QueueStore::new(feed.clone(), 20));
        queue.load_initial().await.unwrap();
        let coordinator = Arc::new(SwipeCoordinator::new(
            queue.clone(),
            telemetry,
            Arc::new(FixedTimeProvider(42_000)),
            Arc::new(SequentialIdProvider::new("session")),
            3,
            None,
        ));
        Fixture {
            feed,
            queue,
            coordinator,
        }
    }

    #[tokio::test]
    async fn test_commit_advances_cursor_and_counts() {
        let telemetry = Arc::new(RecordingTelemetry::new());
        let f = fixture(MockJobFeed::with_catalog(20), telemetry.clone()).await;

        let receipt = f
            .coordinator
            .on_commit("job-1", SwipeDirection::Right)
            .into_receipt()
            .unwrap();
        receipt.telemetry.unwrap().await.unwrap();

        assert_eq!(receipt.cursor, 1);
        assert_eq!(receipt.remaining, 19);
        assert!(receipt.prefetch.is_none());
        assert_eq!(f.coordinator.stats(), SwipeStats { liked: 1, passed: 0 });
        assert_eq!(
            telemetry.events(),
            vec![SwipeEvent {
                job_id: "job-1".to_string(),
                direction: SwipeDirection::Right,
                session_id: "session-1".to_string(),
                swiped_at_ms: 42_000,
            }]
        );
    }

    #[tokio::test]
    async fn test_stale_commit_is_ignored() {
        let f = fixture(
            MockJobFeed::with_catalog(20),
            Arc::new(RecordingTelemetry::new()),
        )
        .await;

        let outcome = f.coordinator.on_commit("job-5", SwipeDirection::Left);

        assert!(!outcome.is_recorded());
        assert_eq!(f.queue.snapshot().cursor, 0);
        assert_eq!(f.coordinator.stats(), SwipeStats::default());
    }

    #[tokio::test]
    async fn test_duplicate_commit_counts_once() {
        let f = fixture(
            MockJobFeed::with_catalog(20),
            Arc::new(RecordingTelemetry::new()),
        )
        .await;

        assert!(f.coordinator.on_commit("job-1", SwipeDirection::Left).is_recorded());
        assert!(!f.coordinator.on_commit("job-1", SwipeDirection::Left).is_recorded());

        assert_eq!(f.coordinator.stats().passed, 1);
        assert_eq!(f.queue.snapshot().cursor, 1);
    }

    #[tokio::test]
    async fn test_prefetch_triggered_at_threshold_only() {
        let f = fixture(
            MockJobFeed::with_catalog(60),
            Arc::new(RecordingTelemetry::new()),
        )
        .await;

        for n in 1..=16 {
            let receipt = f
                .coordinator
                .on_commit(&format!("job-{}", n), SwipeDirection::Right)
                .into_receipt()
                .unwrap();
            assert!(!receipt.prefetch_triggered(), "swipe {} prefetched", n);
        }

        let receipt = f
            .coordinator
            .on_commit("job-17", SwipeDirection::Right)
            .into_receipt()
            .unwrap();
        assert_eq!(receipt.remaining, 3);
        let outcome = receipt.prefetch.unwrap().await.unwrap();

        assert!(matches!(outcome, PrefetchOutcome::Appended { added: 20, .. }));
        assert_eq!(f.feed.request_count(), 2);
        assert_eq!(f.queue.snapshot().len, 40);
    }

    #[tokio::test]
    async fn test_no_prefetch_when_feed_exhausted() {
        let f = fixture(
            MockJobFeed::with_catalog(5),
            Arc::new(RecordingTelemetry::new()),
        )
        .await;

        for n in 1..=5 {
            let receipt = f
                .coordinator
                .on_commit(&format!("job-{}", n), SwipeDirection::Left)
                .into_receipt()
                .unwrap();
            assert!(!receipt.prefetch_triggered());
        }

        assert!(f.coordinator.is_terminal());
        assert_eq!(f.coordinator.stats(), SwipeStats { liked: 0, passed: 5 });
        assert_eq!(f.feed.request_count(), 1);
    }

    #[tokio::test]
    async fn test_telemetry_failure_does_not_block_progress() {
        let f = fixture(
            MockJobFeed::with_catalog(20),
            Arc::new(RecordingTelemetry::new_failing()),
        )
        .await;

        for n in 1..=3 {
            let receipt = f
                .coordinator
                .on_commit(&format!("job-{}", n), SwipeDirection::Right)
                .into_receipt()
                .unwrap();
            receipt.telemetry.unwrap().await.unwrap();
        }

        assert_eq!(f.queue.snapshot().cursor, 3);
        assert_eq!(f.coordinator.stats().liked, 3);
    }

    #[tokio::test]
    async fn test_telemetry_called_once_per_swipe() {
        let mut telemetry = MockSwipeTelemetry::new();
        telemetry
            .expect_record_swipe()
            .withf(|event| event.job_id == "job-1" && event.direction == SwipeDirection::Left)
            .times(1)
            .returning(|_| Ok(()));
        let f = fixture(MockJobFeed::with_catalog(20), Arc::new(telemetry)).await;

        let receipt = f
            .coordinator
            .on_commit("job-1", SwipeDirection::Left)
            .into_receipt()
            .unwrap();
        receipt.telemetry.unwrap().await.unwrap();

        // Stale commit must not reach telemetry
        assert!(!f.coordinator.on_commit("job-1", SwipeDirection::Left).is_recorded());
    }

    #[tokio::test]
    async fn test_refresh_zeroes_stats_and_reloads() {
        let f = fixture(
            MockJobFeed::with_catalog(20),
            Arc::new(RecordingTelemetry::new()),
        )
        .await;
        f.coordinator.on_commit("job-1", SwipeDirection::Right);
        f.coordinator.on_commit("job-2", SwipeDirection::Left);

        let loaded = f.coordinator.refresh().await.unwrap();

        assert_eq!(loaded, 20);
        assert_eq!(f.coordinator.stats(), SwipeStats::default());
        assert_eq!(f.queue.snapshot().cursor, 0);
        assert_eq!(f.queue.current_id().as_deref(), Some("job-1"));
    }

    #[tokio::test]
    async fn test_preference_change_triggers_refresh() {
        let feed = Arc::new(MockJobFeed::with_catalog(20));
        let queue = Arc::new(QueueStore::new(feed.clone(), 20));
        queue.load_initial().await.unwrap();
        let (notifier, subscription) = preference_channel();
        let coordinator = Arc::new(SwipeCoordinator::new(
            queue.clone(),
            Arc::new(RecordingTelemetry::new()),
            Arc::new(FixedTimeProvider(0)),
            Arc::new(SequentialIdProvider::new("s")),
            3,
            Some(subscription),
        ));
        let listener = coordinator.spawn_preference_listener().unwrap();
        assert!(coordinator.spawn_preference_listener().is_none());

        coordinator.on_commit("job-1", SwipeDirection::Right);
        notifier.notify();
        while queue.snapshot().generation == 0 || queue.snapshot().load_in_flight {
            tokio::task::yield_now().await;
        }

        drop(notifier);
        listener.await.unwrap();

        assert_eq!(coordinator.stats(), SwipeStats::default());
        assert_eq!(queue.snapshot().cursor, 0);
        assert_eq!(feed.request_count(), 2);
    }

    #[test]
    fn test_commit_without_runtime_still_counts() {
        let feed = Arc::new(MockJobFeed::with_catalog(3));
        let queue = Arc::new(QueueStore::new(feed, 20));
        tokio_test::block_on(queue.load_initial()).unwrap();
        let coordinator = SwipeCoordinator::new(
            queue.clone(),
            Arc::new(RecordingTelemetry::new()),
            Arc::new(FixedTimeProvider(0)),
            Arc::new(SequentialIdProvider::new("s")),
            3,
            None,
        );

        let receipt = coordinator
            .on_commit("job-1", SwipeDirection::Right)
            .into_receipt()
            .unwrap();

        assert!(receipt.telemetry.is_none());
        assert_eq!(coordinator.stats().liked, 1);
    }
}
