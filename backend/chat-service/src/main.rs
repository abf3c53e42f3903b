use chat_service::{
    config::{Config, StoreBackend},
    error::AppError,
    logging,
    registry::SubscriberRegistry,
    server,
    services::ChatService,
    state::AppState,
    store::{ChatStore, MemoryStore, RedisStore},
};
use redis_utils::RedisPool;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    let cfg = Arc::new(Config::from_env()?);
    logging::init_tracing(cfg.log_format);

    let store: Arc<dyn ChatStore> = match cfg.store_backend {
        StoreBackend::Redis => {
            tracing::info!(
                redis_url = %cfg.redis_url,
                retry_interval_ms = cfg.store_retry_interval.as_millis() as u64,
                "waiting for Redis"
            );
            let pool = RedisPool::connect_when_ready(&cfg.redis_url, &cfg.store_retry_policy())
                .await
                .map_err(|e| AppError::StartServer(format!("redis: {e:#}")))?;
            Arc::new(RedisStore::new(pool.manager()))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; messages are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let registry = SubscriberRegistry::new(cfg.subscriber_channel_capacity);
    let service = ChatService::new(store, registry, cfg.store_keys());

    server::run(AppState::new(service, cfg)).await
}
