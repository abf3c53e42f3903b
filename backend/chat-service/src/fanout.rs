//! Event fan-out.
//!
//! Publishing never waits on a subscriber: each target gets a `try_send`, and a
//! subscriber that has not drained its previous event misses this one.

use crate::models::Message;
use crate::registry::{SubscriberHandle, SubscriberRegistry, SubscriptionKind};
use tokio::sync::mpsc::error::TrySendError;

/// Outcome of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Target channel was full
    pub dropped: usize,
    /// Target already disconnected, awaiting cleanup
    pub closed: usize,
}

impl BroadcastReport {
    pub fn targets(&self) -> usize {
        self.delivered + self.dropped + self.closed
    }
}

#[derive(Clone)]
pub struct Fanout {
    registry: SubscriberRegistry,
}

impl Fanout {
    pub fn new(registry: SubscriberRegistry) -> Self {
        Self { registry }
    }

    pub fn broadcast_message(&self, message: &Message) -> BroadcastReport {
        let targets = self.registry.snapshot_message_subscribers();
        deliver(SubscriptionKind::MessagePosted, targets, message)
    }

    pub fn broadcast_user_joined(&self, identity: &str) -> BroadcastReport {
        let targets = self.registry.snapshot_user_subscribers();
        deliver(SubscriptionKind::UserJoined, targets, &identity.to_string())
    }
}

fn deliver<T: Clone>(
    kind: SubscriptionKind,
    targets: Vec<SubscriberHandle<T>>,
    event: &T,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for target in targets {
        match target.sender.try_send(event.clone()) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                tracing::debug!(
                    %kind,
                    user = %target.identity,
                    subscriber_id = %target.id,
                    "subscriber not draining, event dropped"
                );
            }
            Err(TrySendError::Closed(_)) => report.closed += 1,
        }
    }

    if report.targets() > 0 {
        tracing::debug!(
            %kind,
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "broadcast complete"
        );
    }
    report
}
