//! Queue Store - buffered, de-duplicated, paginated job sequence
//!
//! Owns the fetched items, the read cursor and the pagination flags.
//! Every fetch is tagged with the store generation at the moment it starts;
//! `reset()` bumps the generation so that responses arriving afterwards are
//! discarded instead of mixed into the fresh deck.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::constants::MAX_DUPLICATE_PAGES;
use super::stack_view::{build_stack, compute_window, StackCard};
use crate::domain::{JobId, JobRecord};
use crate::error::{AppError, Result};
use crate::port::{FeedError, JobFeed, PageRequest};

/// Why a prefetch did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another prefetch is outstanding
    InFlight,
    /// The initial load is outstanding
    LoadInFlight,
    /// The feed already reported its last page
    Exhausted,
}

/// Result of `prefetch_next()`; prefetch failures never propagate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchOutcome {
    Skipped(SkipReason),
    Appended {
        added: usize,
        duplicates: usize,
        has_more: bool,
    },
    /// Fetch failed; the feed is now treated as exhausted
    Failed(FeedError),
    /// A `reset()` happened while the fetch was outstanding
    Stale,
}

/// Read-only view of the pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub len: usize,
    pub cursor: usize,
    pub remaining: usize,
    pub has_more: bool,
    pub next_page_token: u32,
    pub load_in_flight: bool,
    pub prefetch_in_flight: bool,
    pub generation: u64,
}

/// Result of a successful cursor advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorAdvance {
    pub cursor: usize,
    pub remaining: usize,
    pub has_more: bool,
}

struct QueueState {
    items: Vec<JobRecord>,
    seen: HashSet<JobId>,
    cursor: usize,
    next_page_token: u32,
    has_more: bool,
    load_in_flight: bool,
    prefetch_in_flight: bool,
    generation: u64,
}

impl QueueState {
    fn new(generation: u64) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: 0,
            next_page_token: 0,
            // Unknown until the first page lands; an unloaded deck is not exhausted
            has_more: true,
            load_in_flight: false,
            prefetch_in_flight: false,
            generation,
        }
    }

    fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.cursor)
    }

    /// Append jobs whose id is not already buffered. Returns the number added.
    fn append_unique(&mut self, jobs: Vec<JobRecord>) -> usize {
        let mut added = 0;
        for job in jobs {
            if let Err(e) = job.validate() {
                warn!(error = %e, "Dropping job record without id");
                continue;
            }
            if self.seen.insert(job.id.clone()) {
                self.items.push(job);
                added += 1;
            }
        }
        added
    }
}

#[derive(Clone, Copy)]
enum FlightKind {
    Load,
    Prefetch,
}

/// Clears an in-flight flag on every exit path of a fetch (success, error,
/// or the future being dropped), unless a reset already replaced the state.
struct InFlightGuard<'a> {
    store: &'a QueueStore,
    kind: FlightKind,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        if state.generation != self.generation {
            return;
        }
        match self.kind {
            FlightKind::Load => state.load_in_flight = false,
            FlightKind::Prefetch => state.prefetch_in_flight = false,
        }
    }
}

/// In-memory job queue fed by a paginated `JobFeed`
pub struct QueueStore {
    feed: Arc<dyn JobFeed>,
    page_size: usize,
    state: Mutex<QueueState>,
}

impl QueueStore {
    pub fn new(feed: Arc<dyn JobFeed>, page_size: usize) -> Self {
        Self {
            feed,
            page_size: page_size.max(1),
            state: Mutex::new(QueueState::new(0)),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the first page, replacing whatever is buffered.
    ///
    /// Fails with `AppError::InvalidState` while another fetch is outstanding
    /// and with `AppError::Fetch` when the feed fails; in both cases the
    /// buffered state is left untouched.
    pub async fn load_initial(&self) -> Result<usize> {
        let generation = {
            let mut state = self.lock();
            if state.load_in_flight || state.prefetch_in_flight {
                return Err(AppError::InvalidState(
                    "cannot load while another fetch is in flight".to_string(),
                ));
            }
            state.load_in_flight = true;
            state.generation
        };
        self.fetch_first_page(generation).await
    }

    /// Second half of a load; the caller has already set `load_in_flight`
    /// for `generation`.
    async fn fetch_first_page(&self, generation: u64) -> Result<usize> {
        let _guard = InFlightGuard {
            store: self,
            kind: FlightKind::Load,
            generation,
        };

        info!(generation, page_size = self.page_size, "Loading first page of jobs");

        let jobs = self
            .feed
            .fetch_page(PageRequest::first(self.page_size))
            .await
            .map_err(|e| {
                warn!(generation, error = %e, "Initial job load failed");
                AppError::Fetch(e)
            })?;

        let mut state = self.lock();
        if state.generation != generation {
            return Err(AppError::StaleEvent(format!(
                "initial load from generation {} finished after a reset",
                generation
            )));
        }

        let returned = jobs.len();
        state.items.clear();
        state.seen.clear();
        let added = state.append_unique(jobs);
        state.cursor = 0;
        state.next_page_token = 1;
        state.has_more = returned == self.page_size;

        info!(
            generation,
            returned,
            added,
            has_more = state.has_more,
            "First page loaded"
        );
        Ok(state.items.len())
    }

    /// Fetch and append the next page.
    ///
    /// No-op while another fetch is outstanding or once the feed is
    /// exhausted. A failed fetch marks the feed exhausted so that callers do
    /// not retry in a loop. Full pages that add no new job are skipped until
    /// one does, the feed ends, or `MAX_DUPLICATE_PAGES` is reached.
    pub async fn prefetch_next(&self) -> PrefetchOutcome {
        let (generation, page_token) = {
            let mut state = self.lock();
            if state.prefetch_in_flight {
                debug!("Prefetch skipped: already in flight");
                return PrefetchOutcome::Skipped(SkipReason::InFlight);
            }
            if state.load_in_flight {
                debug!("Prefetch skipped: initial load in flight");
                return PrefetchOutcome::Skipped(SkipReason::LoadInFlight);
            }
            if !state.has_more {
                debug!("Prefetch skipped: feed exhausted");
                return PrefetchOutcome::Skipped(SkipReason::Exhausted);
            }
            state.prefetch_in_flight = true;
            (state.generation, state.next_page_token)
        };
        let _guard = InFlightGuard {
            store: self,
            kind: FlightKind::Prefetch,
            generation,
        };

        let mut page_token = page_token;
        let mut duplicates = 0;
        let mut skipped_pages = 0;
        loop {
            debug!(generation, page_token, "Prefetching next page");

            let result = self
                .feed
                .fetch_page(PageRequest::next(self.page_size, page_token))
                .await;

            let mut state = self.lock();
            if state.generation != generation {
                info!(generation, page_token, "Discarding prefetch response from before reset");
                return PrefetchOutcome::Stale;
            }

            let jobs = match result {
                Ok(jobs) => jobs,
                Err(e) => {
                    warn!(
                        generation,
                        page_token,
                        error = %e,
                        "Prefetch failed; treating feed as exhausted"
                    );
                    state.has_more = false;
                    return PrefetchOutcome::Failed(e);
                }
            };

            let returned = jobs.len();
            let added = state.append_unique(jobs);
            duplicates += returned - added;
            state.has_more = returned == self.page_size;
            state.next_page_token = page_token + 1;

            // A full page of known jobs says nothing about the rest of the
            // feed; keep going so the buffer never drains while more exist
            if added == 0 && state.has_more {
                skipped_pages += 1;
                if skipped_pages >= MAX_DUPLICATE_PAGES {
                    warn!(
                        generation,
                        page_token,
                        skipped_pages,
                        "Feed keeps serving known jobs; treating it as exhausted"
                    );
                    state.has_more = false;
                } else {
                    debug!(generation, page_token, "Page held only known jobs; fetching the next one");
                    page_token = state.next_page_token;
                    continue;
                }
            }

            info!(
                generation,
                page_token,
                returned,
                added,
                skipped_pages,
                has_more = state.has_more,
                "Prefetched page appended"
            );
            return PrefetchOutcome::Appended {
                added,
                duplicates,
                has_more: state.has_more,
            };
        }
    }

    /// Drop everything, invalidate outstanding fetches and reload page one.
    ///
    /// The reload is marked in flight under the same lock that bumps the
    /// generation, so no snapshot ever shows a reset queue that is idle.
    pub async fn reset(&self) -> Result<usize> {
        let generation = {
            let mut state = self.lock();
            let generation = state.generation + 1;
            *state = QueueState::new(generation);
            state.load_in_flight = true;
            info!(generation, "Queue reset");
            generation
        };
        self.fetch_first_page(generation).await
    }

    /// Move past the current card. Only the coordinator calls this.
    pub(crate) fn advance_cursor(&self, job_id: &str) -> Result<CursorAdvance> {
        let mut state = self.lock();
        let current = state.items.get(state.cursor).map(|job| job.id.clone());
        match current {
            Some(id) if id == job_id => {
                state.cursor += 1;
                Ok(CursorAdvance {
                    cursor: state.cursor,
                    remaining: state.remaining(),
                    has_more: state.has_more,
                })
            }
            Some(id) => Err(AppError::StaleEvent(format!(
                "commit for {} but the top card is {}",
                job_id, id
            ))),
            None => Err(AppError::StaleEvent(format!(
                "commit for {} but the deck is empty",
                job_id
            ))),
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.lock();
        QueueSnapshot {
            len: state.items.len(),
            cursor: state.cursor,
            remaining: state.remaining(),
            has_more: state.has_more,
            next_page_token: state.next_page_token,
            load_in_flight: state.load_in_flight,
            prefetch_in_flight: state.prefetch_in_flight,
            generation: state.generation,
        }
    }

    /// Bumped by every `reset()`
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Next unconsumed job (the topmost card)
    pub fn current(&self) -> Option<JobRecord> {
        let state = self.lock();
        state.items.get(state.cursor).cloned()
    }

    pub fn current_id(&self) -> Option<JobId> {
        let state = self.lock();
        state.items.get(state.cursor).map(|job| job.id.clone())
    }

    /// Back-to-front window starting at the cursor
    pub fn window(&self, window_size: usize) -> Vec<JobRecord> {
        let state = self.lock();
        compute_window(&state.items, state.cursor, window_size)
    }

    /// Window with composite attributes, back-to-front
    pub fn stack(&self, window_size: usize) -> Vec<StackCard> {
        let state = self.lock();
        build_stack(&state.items, state.cursor, window_size)
    }

    /// Ids of every buffered job, in order
    pub fn item_ids(&self) -> Vec<JobId> {
        self.lock().items.iter().map(|job| job.id.clone()).collect()
    }

    /// No cards left and nothing more to fetch
    pub fn is_exhausted(&self) -> bool {
        let state = self.lock();
        state.cursor >= state.items.len() && !state.has_more
    }
}
