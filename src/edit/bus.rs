use std::cell::RefCell;
use std::rc::Rc;

use super::error::{EditError, EditResult};
use super::validity::FieldId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EditEvent {
    CommitRequested,
    CancelRequested,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionHandle(u64);

type EventHandler = Rc<dyn Fn(EditEvent) -> EditResult<()>>;

struct Subscription {
    handle: SubscriptionHandle,
    subscriber: FieldId,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    next_handle: u64,
    subscriptions: Vec<Subscription>,
}

#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures: Vec<(FieldId, EditError)>,
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Synchronous broadcast channel scoped to a single edit session.
///
/// `publish` returns only after every handler subscribed at call time has
/// run, in subscription order. Handlers may unsubscribe themselves (or
/// others) while a publish is in flight; a handler removed before its turn is
/// skipped.
#[derive(Clone, Default)]
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        subscriber: FieldId,
        handler: impl Fn(EditEvent) -> EditResult<()> + 'static,
    ) -> SubscriptionHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = SubscriptionHandle(state.next_handle);
        tracing::trace!(subscriber = %subscriber, handle = handle.0, "subscribing to edit events");
        state.subscriptions.push(Subscription {
            handle,
            subscriber,
            handler: Rc::new(handler),
        });
        handle
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.subscriptions.len();
        state.subscriptions.retain(|entry| entry.handle != handle);
        let removed = state.subscriptions.len() != before;
        if removed {
            tracing::trace!(handle = handle.0, "unsubscribed from edit events");
        }
        removed
    }

    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .any(|entry| entry.handle == handle)
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    pub fn publish(&self, event: EditEvent) -> DeliveryReport {
        let targets = self
            .state
            .borrow()
            .subscriptions
            .iter()
            .map(|entry| (entry.handle, entry.subscriber.clone(), entry.handler.clone()))
            .collect::<Vec<_>>();
        tracing::debug!(?event, subscribers = targets.len(), "publishing edit event");

        let mut report = DeliveryReport::default();
        for (handle, subscriber, handler) in targets {
            if !self.is_subscribed(handle) {
                continue;
            }
            report.delivered += 1;
            if let Err(error) = handler(event) {
                tracing::warn!(subscriber = %subscriber, %error, "edit event handler failed");
                report.failures.push((subscriber, error));
            }
        }
        report
    }
}
