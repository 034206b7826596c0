// Detached task helper for fire-and-forget side effects

use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

/// Spawn `future` on the current Tokio runtime.
///
/// Outside a runtime the side effect is skipped and logged instead of
/// panicking; the deck keeps working, it just loses the background work.
pub(crate) fn spawn_detached<F>(what: &'static str, future: F) -> Option<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Some(handle.spawn(future)),
        Err(_) => {
            warn!(task = what, "No async runtime available; background task skipped");
            None
        }
    }
}
