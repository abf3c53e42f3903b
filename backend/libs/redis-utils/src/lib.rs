use anyhow::{anyhow, Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionAddr, ConnectionInfo, IntoConnectionInfo};
use resilience::{with_retry, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Interval used between readiness probes when the caller does not override it.
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(2);

/// Redis connection pool backed by a single multiplexed connection manager.
pub struct RedisPool {
    manager: SharedConnectionManager,
    addr_label: String,
}

impl RedisPool {
    /// Connect once, failing if the server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info = parse_connection_info(redis_url)?;
        let addr_label = describe_addr(&info.addr);

        let client = Client::open(info).context("failed to construct Redis client")?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
            addr_label,
        })
    }

    /// Connect and wait until the server answers `PING`, retrying per `policy`.
    ///
    /// With [`RetryConfig::fixed_forever`] this only returns once Redis is reachable.
    pub async fn connect_when_ready(redis_url: &str, policy: &RetryConfig) -> Result<Self> {
        // Reject malformed URLs up front; retrying cannot fix them.
        parse_connection_info(redis_url)?;

        let pool = with_retry(policy, move || async move {
            let pool = Self::connect(redis_url).await?;
            pool.ping().await?;
            Ok::<_, anyhow::Error>(pool)
        })
        .await
        .map_err(|e| anyhow!("Redis never became ready: {e}"))?;

        info!(addr = %pool.addr_label, "Redis connection ready");
        Ok(pool)
    }

    /// Single liveness probe.
    pub async fn ping(&self) -> Result<()> {
        ping(&self.manager).await
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }
}

/// Send `PING` over a shared manager and require `PONG` back.
pub async fn ping(manager: &SharedConnectionManager) -> Result<()> {
    let mut conn = manager.lock().await.clone();
    let reply: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .context("Redis PING failed")?;

    if reply == "PONG" {
        Ok(())
    } else {
        Err(anyhow!("unexpected PING reply: {reply}"))
    }
}

/// Accept both full URLs and bare `host:port` addresses.
pub fn normalize_redis_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("redis://")
        || trimmed.starts_with("rediss://")
        || trimmed.starts_with("redis+unix://")
        || trimmed.starts_with("unix://")
    {
        trimmed.to_string()
    } else {
        format!("redis://{}", trimmed)
    }
}

fn describe_addr(addr: &ConnectionAddr) -> String {
    match addr {
        ConnectionAddr::Tcp(host, port) => format!("{}:{}", host, port),
        ConnectionAddr::TcpTls { host, port, .. } => format!("{}:{}", host, port),
        ConnectionAddr::Unix(path) => path.display().to_string(),
        #[allow(unreachable_patterns)]
        _ => "redis".to_string(),
    }
}

fn parse_connection_info(redis_url: &str) -> Result<ConnectionInfo> {
    normalize_redis_url(redis_url)
        .into_connection_info()
        .context("failed to parse REDIS_URL connection string")
}
