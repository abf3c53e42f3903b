//! Redis-backed store tests.
//!
//! Run with a local server: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

use chat_service::registry::SubscriberRegistry;
use chat_service::services::{ChatService, StoreKeys};
use chat_service::store::{ChatStore, RedisStore};
use redis_utils::RedisPool;
use std::sync::Arc;
use uuid::Uuid;

async fn connect() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let pool = RedisPool::connect(&url).await.expect("redis available");
    RedisStore::new(pool.manager())
}

fn unique(prefix: &str) -> String {
    format!("test:{prefix}:{}", Uuid::new_v4())
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_log_returns_newest_first() {
    let store = connect().await;
    let key = unique("log");

    store.append_to_log(&key, "first".into()).await.unwrap();
    store.append_to_log(&key, "second".into()).await.unwrap();

    assert_eq!(store.read_log(&key).await.unwrap(), vec!["second", "first"]);
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_set_reports_new_members() {
    let store = connect().await;
    let key = unique("users");

    assert!(store.add_to_set(&key, "alice").await.unwrap());
    assert!(!store.add_to_set(&key, "alice").await.unwrap());
    assert_eq!(store.read_set(&key).await.unwrap(), vec!["alice"]);
    store.ping().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_service_round_trip_over_redis() {
    let store = Arc::new(connect().await);
    let keys = StoreKeys {
        messages: unique("messages"),
        users: unique("users"),
    };
    let service = ChatService::new(store, SubscriberRegistry::default(), keys);

    let mut bob = service.subscribe_messages("bob").await.unwrap();
    let posted = service.post_message("alice", "over redis").await.unwrap();

    assert_eq!(bob.recv().await.unwrap(), posted);
    assert_eq!(service.list_messages().await.unwrap(), vec![posted]);
    assert_eq!(service.list_users().await.unwrap(), vec!["alice", "bob"]);
}
