//! Subscriber registry.
//!
//! Tracks one delivery channel per identity for each event kind. Both maps sit
//! behind a single lock which is only held to insert, remove or copy entries;
//! sends always happen on a snapshot, outside the lock.

use crate::models::Message;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Unique identifier for one subscription instance
///
/// An identity can be re-registered; the id lets cleanup tell the current
/// registration apart from one it has already replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    MessagePosted,
    UserJoined,
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionKind::MessagePosted => write!(f, "messagePosted"),
            SubscriptionKind::UserJoined => write!(f, "userJoined"),
        }
    }
}

/// Registered entry with ID and channel
struct Subscriber<T> {
    id: SubscriberId,
    sender: Sender<T>,
}

/// One broadcast target copied out of the registry.
pub struct SubscriberHandle<T> {
    pub identity: String,
    pub id: SubscriberId,
    pub(crate) sender: Sender<T>,
}

#[derive(Default)]
struct Maps {
    messages: BTreeMap<String, Subscriber<Message>>,
    users: BTreeMap<String, Subscriber<String>>,
}

/// Registry of live subscriber channels, keyed by identity.
#[derive(Clone)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<Maps>>,
    capacity: usize,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl SubscriberRegistry {
    /// `capacity` is the per-subscriber buffer; zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Maps::default())),
            capacity: capacity.max(1),
        }
    }

    /// Allocate a message channel for `identity`, replacing any previous one.
    pub fn register_message_subscriber(&self, identity: &str) -> (SubscriberId, Receiver<Message>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = SubscriberId::new();
        let replaced = insert(&mut self.inner.lock().messages, identity, id, tx);
        log_registered(SubscriptionKind::MessagePosted, identity, id, replaced);
        (id, rx)
    }

    /// Allocate a user-joined channel for `identity`, replacing any previous one.
    pub fn register_user_subscriber(&self, identity: &str) -> (SubscriberId, Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = SubscriberId::new();
        let replaced = insert(&mut self.inner.lock().users, identity, id, tx);
        log_registered(SubscriptionKind::UserJoined, identity, id, replaced);
        (id, rx)
    }

    /// Remove the entry for `identity` if it still belongs to subscription `id`.
    ///
    /// Returns whether anything was removed; repeated calls are no-ops.
    pub fn unregister(&self, kind: SubscriptionKind, identity: &str, id: SubscriberId) -> bool {
        let removed = {
            let mut maps = self.inner.lock();
            match kind {
                SubscriptionKind::MessagePosted => remove(&mut maps.messages, identity, id),
                SubscriptionKind::UserJoined => remove(&mut maps.users, identity, id),
            }
        };

        if removed {
            tracing::debug!(%kind, user = identity, subscriber_id = %id, "subscriber removed");
        }
        removed
    }

    pub fn unregister_message_subscriber(&self, identity: &str, id: SubscriberId) -> bool {
        self.unregister(SubscriptionKind::MessagePosted, identity, id)
    }

    pub fn unregister_user_subscriber(&self, identity: &str, id: SubscriberId) -> bool {
        self.unregister(SubscriptionKind::UserJoined, identity, id)
    }

    /// Copy of the message targets, ordered by identity.
    pub fn snapshot_message_subscribers(&self) -> Vec<SubscriberHandle<Message>> {
        snapshot(&self.inner.lock().messages)
    }

    /// Copy of the user-joined targets, ordered by identity.
    pub fn snapshot_user_subscribers(&self) -> Vec<SubscriberHandle<String>> {
        snapshot(&self.inner.lock().users)
    }

    pub fn message_subscriber_count(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn user_subscriber_count(&self) -> usize {
        self.inner.lock().users.len()
    }

    pub fn is_registered(&self, kind: SubscriptionKind, identity: &str) -> bool {
        let maps = self.inner.lock();
        match kind {
            SubscriptionKind::MessagePosted => maps.messages.contains_key(identity),
            SubscriptionKind::UserJoined => maps.users.contains_key(identity),
        }
    }
}

fn insert<T>(
    map: &mut BTreeMap<String, Subscriber<T>>,
    identity: &str,
    id: SubscriberId,
    sender: Sender<T>,
) -> bool {
    // A replaced entry drops its sender, which ends the old subscriber's stream.
    map.insert(identity.to_string(), Subscriber { id, sender })
        .is_some()
}

fn remove<T>(map: &mut BTreeMap<String, Subscriber<T>>, identity: &str, id: SubscriberId) -> bool {
    match map.get(identity) {
        Some(current) if current.id == id => map.remove(identity).is_some(),
        _ => false,
    }
}

fn snapshot<T>(map: &BTreeMap<String, Subscriber<T>>) -> Vec<SubscriberHandle<T>> {
    map.iter()
        .map(|(identity, subscriber)| SubscriberHandle {
            identity: identity.clone(),
            id: subscriber.id,
            sender: subscriber.sender.clone(),
        })
        .collect()
}

fn log_registered(kind: SubscriptionKind, identity: &str, id: SubscriberId, replaced: bool) {
    if replaced {
        tracing::warn!(%kind, user = identity, subscriber_id = %id, "subscriber replaced an existing registration");
    } else {
        tracing::debug!(%kind, user = identity, subscriber_id = %id, "subscriber registered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let registry = SubscriberRegistry::default();
        let (id, _rx) = registry.register_message_subscriber("bob");

        assert!(registry.is_registered(SubscriptionKind::MessagePosted, "bob"));
        assert!(!registry.is_registered(SubscriptionKind::UserJoined, "bob"));
        assert_eq!(registry.message_subscriber_count(), 1);

        assert!(registry.unregister_message_subscriber("bob", id));
        assert!(!registry.unregister_message_subscriber("bob", id));
        assert_eq!(registry.message_subscriber_count(), 0);
    }

    #[test]
    fn test_unregister_absent_identity_is_noop() {
        let registry = SubscriberRegistry::default();
        assert!(!registry.unregister_user_subscriber("nobody", SubscriberId::new()));
    }

    #[test]
    fn test_second_registration_replaces_first() {
        let registry = SubscriberRegistry::default();
        let (first, mut first_rx) = registry.register_user_subscriber("carol");
        let (second, _second_rx) = registry.register_user_subscriber("carol");

        assert_eq!(registry.user_subscriber_count(), 1);
        // The replaced channel is closed.
        assert!(matches!(
            first_rx.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        ));

        // Stale cleanup must not evict the newer registration.
        assert!(!registry.unregister_user_subscriber("carol", first));
        assert!(registry.is_registered(SubscriptionKind::UserJoined, "carol"));

        assert!(registry.unregister_user_subscriber("carol", second));
        assert!(!registry.is_registered(SubscriptionKind::UserJoined, "carol"));
    }

    #[test]
    fn test_snapshot_is_ordered_and_detached() {
        let registry = SubscriberRegistry::default();
        let (_, _rx_c) = registry.register_message_subscriber("carol");
        let (_, _rx_a) = registry.register_message_subscriber("alice");
        let (bob, _rx_b) = registry.register_message_subscriber("bob");

        let targets = registry.snapshot_message_subscribers();
        let names: Vec<_> = targets.iter().map(|t| t.identity.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);

        // Mutating the registry does not affect an existing snapshot.
        registry.unregister_message_subscriber("bob", bob);
        assert_eq!(targets.len(), 3);
        assert_eq!(registry.snapshot_message_subscribers().len(), 2);
    }

    #[test]
    fn test_zero_capacity_still_buffers_one_event() {
        let registry = SubscriberRegistry::new(0);
        let (_, mut rx) = registry.register_user_subscriber("slow");
        let fanout = crate::fanout::Fanout::new(registry.clone());

        assert_eq!(fanout.broadcast_user_joined("alice").delivered, 1);
        assert_eq!(fanout.broadcast_user_joined("bob").dropped, 1);
        assert_eq!(rx.try_recv().unwrap(), "alice");
    }

    #[test]
    fn test_capacity_bounds_buffered_events() {
        let registry = SubscriberRegistry::new(3);
        let (_, mut rx) = registry.register_user_subscriber("slow");
        let fanout = crate::fanout::Fanout::new(registry.clone());

        for name in ["a", "b", "c"] {
            assert_eq!(fanout.broadcast_user_joined(name).delivered, 1);
        }
        assert_eq!(fanout.broadcast_user_joined("d").dropped, 1);
        assert_eq!(rx.try_recv().unwrap(), "a");
    }

    #[test]
    fn test_concurrent_register_and_unregister() {
        let registry = SubscriberRegistry::default();
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let identity = format!("user-{n}-{i}");
                        let (id, _rx) = registry.register_message_subscriber(&identity);
                        let _ = registry.snapshot_message_subscribers();
                        assert!(registry.unregister_message_subscriber(&identity, id));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.message_subscriber_count(), 0);
    }
}
