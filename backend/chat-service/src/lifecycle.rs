//! Subscription lifecycle.
//!
//! Every accepted subscription gets a waiter task that unregisters it once the
//! client goes away. The client side holds a [`DisconnectGuard`] inside its
//! [`SubscriptionStream`]; when the transport drops the stream (socket closed,
//! subscription stopped) the guard fires the waiter's [`CancelSignal`].

use crate::registry::{SubscriberId, SubscriberRegistry, SubscriptionKind};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Resolves when the owning connection is gone.
pub type CancelSignal = oneshot::Receiver<()>;

/// Fires the paired [`CancelSignal`] on [`DisconnectGuard::cancel`] or on drop.
#[derive(Debug)]
pub struct DisconnectGuard {
    tx: Option<oneshot::Sender<()>>,
}

impl DisconnectGuard {
    pub fn cancel(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn cancel_pair() -> (DisconnectGuard, CancelSignal) {
    let (tx, rx) = oneshot::channel();
    (DisconnectGuard { tx: Some(tx) }, rx)
}

/// Binds registrations to their connection lifetime.
#[derive(Clone)]
pub struct Lifecycle {
    registry: SubscriberRegistry,
}

impl Lifecycle {
    pub fn new(registry: SubscriberRegistry) -> Self {
        Self { registry }
    }

    /// Spawn a waiter that unregisters `(kind, identity, id)` once `signal` fires.
    ///
    /// The unregister runs at most once per binding and never on the publish path.
    pub fn bind(
        &self,
        kind: SubscriptionKind,
        identity: String,
        id: SubscriberId,
        signal: CancelSignal,
    ) -> JoinHandle<()> {
        let registry = self.registry.clone();

        tokio::spawn(async move {
            // Err means the guard was dropped without an explicit cancel; same outcome.
            let _ = signal.await;

            if registry.unregister(kind, &identity, id) {
                tracing::info!(%kind, user = %identity, subscriber_id = %id, "subscription closed");
            } else {
                tracing::debug!(%kind, user = %identity, subscriber_id = %id, "subscription already replaced or removed");
            }
        })
    }
}

/// Read-only handle to one subscriber's delivery channel.
///
/// The stream ends when the registry drops its sender, which happens when a newer
/// subscription from the same identity replaces this one.
pub struct SubscriptionStream<T> {
    id: SubscriberId,
    receiver: mpsc::Receiver<T>,
    guard: DisconnectGuard,
}

impl<T> SubscriptionStream<T> {
    pub fn new(id: SubscriberId, receiver: mpsc::Receiver<T>, guard: DisconnectGuard) -> Self {
        Self {
            id,
            receiver,
            guard,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event, or `None` once the subscription is over.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Trigger cleanup now instead of waiting for the stream to be dropped.
    pub fn cancel(&mut self) {
        self.guard.cancel();
    }
}

impl<T> Stream for SubscriptionStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
