use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bus::{CommandBus, CommandKey, Subscription};

use super::controller::ViewController;
use super::record::Record;

/// Bus subscription for one mounted view, alive for exactly the view's
/// on-screen lifetime.
///
/// Commands arrive on the synchronous bus but handling them needs async
/// (refresh fetches), so the subscription forwards keys into an unbounded
/// queue drained by a spawned driver task holding the controller lock.
/// Dropping the mount (or calling [`ViewMount::unmount`]) detaches the
/// listener and stops the driver.
pub struct ViewMount {
    subscription: Subscription,
    driver: JoinHandle<()>,
}

impl ViewMount {
    /// Subscribe `controller` to the bus. Each view subscribes on mount and
    /// unsubscribes on unmount, so at any moment at most one list view is
    /// listening; a leftover listener from a previous view is a lifecycle bug
    /// worth flagging.
    pub fn mount<R: Record>(
        bus: &CommandBus,
        controller: Arc<tokio::sync::Mutex<ViewController<R>>>,
    ) -> Self {
        if bus.listener_count() > 0 {
            tracing::warn!(
                "mounting a view while {} listener(s) remain on the bus; a previous view may not have unmounted",
                bus.listener_count()
            );
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<CommandKey>();
        let subscription = bus.subscribe(move |key| {
            let _ = tx.send(key.clone());
        });

        let driver = tokio::spawn(async move {
            while let Some(key) = rx.recv().await {
                controller.lock().await.handle_command(&key).await;
            }
        });

        Self {
            subscription,
            driver,
        }
    }

    /// Detach from the bus and stop handling queued commands.
    pub fn unmount(self) {
        self.subscription.unsubscribe();
        self.driver.abort();
    }
}

impl Drop for ViewMount {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        self.driver.abort();
    }
}
