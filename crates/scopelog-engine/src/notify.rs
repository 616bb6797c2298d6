use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::error;

use scopelog_types::Notification;

/// Handle returned by [`Notifier::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    kind: Notification,
    callback: Box<dyn FnMut()>,
}

/// Synchronous publish/subscribe for engine notifications
///
/// Subscribers of a kind are called in registration order. A panicking
/// subscriber is logged and skipped; later subscribers still run.
#[derive(Default)]
pub struct Notifier {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: Notification, callback: F) -> SubscriptionId
    where
        F: FnMut() + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription; false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() < before
    }

    pub fn emit(&mut self, kind: Notification) {
        for subscriber in self.subscribers.iter_mut().filter(|s| s.kind == kind) {
            let result = catch_unwind(AssertUnwindSafe(|| (subscriber.callback)()));
            if result.is_err() {
                error!(?kind, id = subscriber.id.0, "notification subscriber panicked");
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
