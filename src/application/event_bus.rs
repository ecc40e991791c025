// Event bus - fan-out of terminal command events to subscribers
use crate::application::event::{DashboardEvent, EventKind};
use futures::Stream;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Kind(EventKind),
}

impl EventFilter {
    pub fn matches(&self, event: &DashboardEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kind(kind) => event.kind() == *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventCallback = Arc<dyn Fn(&DashboardEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    callback: EventCallback,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<Subscriber>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // a panicking callback never runs under the lock
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe<F>(&self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        let mut subscribers = self.lock();
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        subscribers.entries.push(Subscriber {
            id,
            filter,
            callback: Arc::new(callback),
        });
        id
    }

    /// Returns whether the subscription was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.entries.len();
        subscribers.entries.retain(|subscriber| subscriber.id != id);
        before != subscribers.entries.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Delivers `event` to every matching subscriber, in subscription order.
    pub fn publish(&self, event: &DashboardEvent) {
        let callbacks: Vec<EventCallback> = self
            .lock()
            .entries
            .iter()
            .filter(|subscriber| subscriber.filter.matches(event))
            .map(|subscriber| subscriber.callback.clone())
            .collect();

        tracing::debug!(
            "Publishing {} for {} to {} subscribers",
            event.kind(),
            event.correlation_id,
            callbacks.len()
        );
        for callback in callbacks {
            callback(event);
        }
    }

    /// Events matching `filter` as an async stream; dropping the stream unsubscribes.
    pub fn stream(&self, filter: EventFilter) -> impl Stream<Item = DashboardEvent> + Send + 'static {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = self.subscribe(filter, move |event| {
            let _ = tx.send(event.clone());
        });
        let guard = StreamSubscription {
            bus: self.clone(),
            id,
        };

        async_stream::stream! {
            let _guard = guard;
            while let Some(event) = rx.recv().await {
                yield event;
            }
        }
    }
}

struct StreamSubscription {
    bus: EventBus,
    id: SubscriptionId,
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}
