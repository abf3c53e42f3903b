//! # Chat Service
//!
//! Orchestrates the durable store and live delivery:
//! - messages are appended to the store first and only broadcast after the write succeeded
//! - identities join the known-users set the first time they post or subscribe,
//!   and only that first time produces a `userJoined` event
//! - subscriptions are registered, then bound to their connection lifetime

use crate::error::{AppError, AppResult};
use crate::fanout::Fanout;
use crate::lifecycle::{cancel_pair, Lifecycle, SubscriptionStream};
use crate::models::Message;
use crate::registry::{SubscriberRegistry, SubscriptionKind};
use crate::store::ChatStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Names of the durable collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub messages: String,
    pub users: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            messages: "messages".to_string(),
            users: "users".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    registry: SubscriberRegistry,
    fanout: Fanout,
    lifecycle: Lifecycle,
    keys: StoreKeys,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>, registry: SubscriberRegistry, keys: StoreKeys) -> Self {
        Self {
            store,
            fanout: Fanout::new(registry.clone()),
            lifecycle: Lifecycle::new(registry.clone()),
            registry,
            keys,
        }
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Add `user` to the known users; returns `true` if it was new.
    ///
    /// Concurrent first calls for the same identity race on the store, and the
    /// set insert decides the winner, so at most one join event is published.
    pub async fn ensure_user(&self, user: &str) -> AppResult<bool> {
        let user = validate_identity(user)?;
        let added = self.store.add_to_set(&self.keys.users, user).await?;

        if added {
            info!(user, "user joined");
            self.fanout.broadcast_user_joined(user);
        }
        Ok(added)
    }

    pub async fn post_message(&self, user: &str, text: &str) -> AppResult<Message> {
        self.ensure_user(user).await?;

        let message = Message::new(user.trim(), text);
        let entry = message.to_json().map_err(|e| {
            warn!(error = %e, "failed to serialize message");
            AppError::Internal
        })?;

        self.store
            .append_to_log(&self.keys.messages, entry)
            .await
            .map_err(|e| {
                warn!(error = %e, user = %message.user, "failed to persist message");
                AppError::from(e)
            })?;

        let report = self.fanout.broadcast_message(&message);
        tracing::debug!(
            message_id = %message.id,
            delivered = report.delivered,
            dropped = report.dropped,
            "message posted"
        );
        Ok(message)
    }

    /// Every stored message, most recent first. Undecodable entries are skipped.
    pub async fn list_messages(&self) -> AppResult<Vec<Message>> {
        let entries = self.store.read_log(&self.keys.messages).await?;

        let messages = entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| match Message::from_json(entry) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(position, error = %e, "skipping undecodable log entry");
                    None
                }
            })
            .collect();
        Ok(messages)
    }

    /// Known users in ascending order.
    pub async fn list_users(&self) -> AppResult<Vec<String>> {
        let mut users = self.store.read_set(&self.keys.users).await?;
        users.sort();
        Ok(users)
    }

    pub async fn subscribe_messages(&self, user: &str) -> AppResult<SubscriptionStream<Message>> {
        self.ensure_user(user).await?;
        let user = user.trim();

        let (id, receiver) = self.registry.register_message_subscriber(user);
        let (guard, signal) = cancel_pair();
        self.lifecycle
            .bind(SubscriptionKind::MessagePosted, user.to_string(), id, signal);

        info!(user, subscriber_id = %id, "messagePosted subscription opened");
        Ok(SubscriptionStream::new(id, receiver, guard))
    }

    pub async fn subscribe_user_joined(&self, user: &str) -> AppResult<SubscriptionStream<String>> {
        self.ensure_user(user).await?;
        let user = user.trim();

        let (id, receiver) = self.registry.register_user_subscriber(user);
        let (guard, signal) = cancel_pair();
        self.lifecycle
            .bind(SubscriptionKind::UserJoined, user.to_string(), id, signal);

        info!(user, subscriber_id = %id, "userJoined subscription opened");
        Ok(SubscriptionStream::new(id, receiver, guard))
    }

    /// Store liveness, for readiness checks.
    pub async fn ping_store(&self) -> AppResult<()> {
        Ok(self.store.ping().await?)
    }
}

fn validate_identity(user: &str) -> AppResult<&str> {
    let user = user.trim();
    if user.is_empty() {
        return Err(AppError::BadRequest("user must not be empty".into()));
    }
    Ok(user)
}
