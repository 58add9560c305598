use std::time::Duration;

use anyhow::Context as _;
use deadpool_redis::redis::{self, AsyncConnectionConfig};
use deadpool_redis::{Manager, Pool, Runtime};

use postbox_domain::id::MessageId;

use crate::domain::repository::MessageBroker;
use crate::error::MessagesServiceError;

/// Slack on top of the longest `BLPOP` before the client gives up on a reply.
const RESPONSE_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Redis list used as a FIFO hand-off: producers `RPUSH`, consumers `BLPOP`.
#[derive(Clone)]
pub struct RedisBroker {
    pub pool: Pool,
    pub queue_key: String,
}

impl RedisBroker {
    /// `max_pop_timeout` bounds the blocking pops this broker will issue. The
    /// client response timeout is stretched past it, otherwise the server could
    /// hand over an id on a reply the client already abandoned.
    pub fn connect(
        url: &str,
        queue_key: impl Into<String>,
        max_pop_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let connection = AsyncConnectionConfig::new()
            .set_response_timeout(Some(response_timeout(max_pop_timeout)));
        let manager = Manager::new_with_config(url, connection).context("parse redis url")?;
        let pool = Pool::builder(manager)
            .runtime(Runtime::Tokio1)
            .build()
            .context("create redis pool")?;
        Ok(Self {
            pool,
            queue_key: queue_key.into(),
        })
    }

    /// Round-trip a `PING`; used as the startup connectivity check.
    pub async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("redis PING")?;
        anyhow::ensure!(reply == "PONG", "unexpected PING reply: {reply}");
        Ok(())
    }
}

impl MessageBroker for RedisBroker {
    async fn push(&self, id: MessageId) -> Result<(), MessagesServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| MessagesServiceError::Internal(e.into()))?;
        let _len: i64 = redis::cmd("RPUSH")
            .arg(&self.queue_key)
            .arg(id.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| MessagesServiceError::Internal(e.into()))?;
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, MessagesServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| MessagesServiceError::Internal(e.into()))?;
        // BLPOP replies nil on timeout, otherwise [key, value].
        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.queue_key)
            .arg(blpop_timeout_secs(timeout))
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| MessagesServiceError::Internal(e.into()))?;
        Ok(popped.map(|(_key, value)| value))
    }
}

/// `BLPOP` treats 0 as "wait forever", so round up to at least one second.
fn blpop_timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

fn response_timeout(max_pop_timeout: Duration) -> Duration {
    Duration::from_secs(blpop_timeout_secs(max_pop_timeout)) + RESPONSE_TIMEOUT_MARGIN
}
