use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::{Event, EventKind};

/// One subscriber's delivery channel, registered under its document.
struct Registered {
    connection_id: String,
    sender: mpsc::UnboundedSender<Event>,
}

/// Per-document pub/sub (§4.5). Subscribers each get their own buffered
/// channel so a slow reader never blocks `publish` for anyone else; a
/// channel whose receiver has been dropped is pruned the next time that
/// document publishes.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<HashMap<String, Vec<Registered>>>,
}

/// A live subscription returned by [`EventBus::subscribe`]. Receives
/// events for one document, in publish order, until dropped or
/// explicitly unsubscribed.
pub struct Subscription {
    pub connection_id: String,
    pub document_id: String,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl Subscription {
    /// Await the next event for this subscription's document.
    /// Returns `None` once the bus side has dropped the sender, which
    /// only happens when the subscription has been explicitly removed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for `document_id`. The subscriber
    /// immediately receives a `connection_established` event carrying
    /// its own connection id, buffered ahead of anything `publish`
    /// sends afterward.
    pub fn subscribe(&self, document_id: impl Into<String>) -> Subscription {
        let document_id = document_id.into();
        let connection_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::unbounded_channel();

        let established = Event::new(
            document_id.clone(),
            EventKind::ConnectionEstablished {
                connection_id: connection_id.clone(),
            },
        );
        // The channel was just created; send cannot fail here.
        let _ = sender.send(established);

        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        subscriptions.entry(document_id.clone()).or_default().push(Registered {
            connection_id: connection_id.clone(),
            sender,
        });

        Subscription {
            connection_id,
            document_id,
            receiver,
        }
    }

    /// Remove a subscription by connection id. A no-op if it was
    /// already dropped or never existed.
    pub fn unsubscribe(&self, document_id: &str, connection_id: &str) {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(subs) = subscriptions.get_mut(document_id) {
            subs.retain(|s| s.connection_id != connection_id);
            if subs.is_empty() {
                subscriptions.remove(document_id);
            }
        }
    }

    /// Broadcast `kind` to every current subscriber of `document_id`,
    /// in the order `publish` is called (the per-subscriber ordering
    /// guarantee in §4.5 and §5). Subscribers whose receiver has been
    /// dropped are pruned rather than treated as an error.
    pub fn publish(&self, document_id: &str, kind: EventKind) {
        let event = Event::new(document_id, kind);
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(subs) = subscriptions.get_mut(document_id) else {
            return;
        };
        subs.retain(|sub| match sub.sender.send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(document_id, connection_id = %sub.connection_id, "dropping dead subscription");
                false
            }
        });
        if subs.is_empty() {
            subscriptions.remove(document_id);
        }
    }

    /// Number of live subscribers for `document_id`. Mostly useful in tests.
    #[must_use]
    pub fn subscriber_count(&self, document_id: &str) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(document_id)
            .map_or(0, Vec::len)
    }
}
