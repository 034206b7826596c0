// Preference Change Signal
// Explicit subscription handed to the coordinator at construction

use tokio::sync::watch;

/// Subscriber side: one per coordinator
pub struct PreferenceSubscription {
    rx: watch::Receiver<u64>,
}

impl PreferenceSubscription {
    /// Wait for the next preference change.
    ///
    /// Returns false once the notifier has been dropped. Bursts of changes
    /// between two waits coalesce into a single wake-up.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Number of changes published so far
    pub fn version(&self) -> u64 {
        *self.rx.borrow()
    }
}

/// Publisher side (e.g. the preferences form)
pub struct PreferenceNotifier {
    tx: watch::Sender<u64>,
}

impl PreferenceNotifier {
    /// Announce that preferences were updated
    pub fn notify(&self) {
        self.tx.send_modify(|version| *version += 1);
    }

    /// Extra subscription on the same signal
    pub fn subscribe(&self) -> PreferenceSubscription {
        PreferenceSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// Create a preference signal
pub fn preference_channel() -> (PreferenceNotifier, PreferenceSubscription) {
    let (tx, rx) = watch::channel(0);
    (PreferenceNotifier { tx }, PreferenceSubscription { rx })
}
