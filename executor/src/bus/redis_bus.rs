//! Production [`Bus`] backed by a Redis stream: each publish is an
//! `XADD <stream> * data <json>` append (spec.md §6 bus protocol).

use std::time::Duration;

use async_trait::async_trait;
use core_types::CanonicalMessage;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::types::{Bus, ExecutorError};

pub struct RedisBus {
    conn: ConnectionManager,
}

impl RedisBus {
    /// Connect to `addr` (a `redis://` URL) and authenticate with
    /// `password` if one is given, probing liveness with a `PING`
    /// bounded by `ping_timeout`. Bootstrap (C11) treats a failure here
    /// as fatal.
    pub async fn connect(
        addr: &str,
        password: Option<&str>,
        ping_timeout: Duration,
    ) -> Result<Self, ExecutorError> {
        let client = redis::Client::open(addr).map_err(|e| ExecutorError::Bus(e.to_string()))?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(|e| ExecutorError::Bus(e.to_string()))?;

        if let Some(pass) = password {
            let _: () = tokio::time::timeout(
                ping_timeout,
                redis::cmd("AUTH").arg(pass).query_async(&mut conn),
            )
            .await
            .map_err(|_| ExecutorError::Bus("AUTH timed out".to_string()))?
            .map_err(|e| ExecutorError::Bus(e.to_string()))?;
        }

        let bus = Self { conn };
        tokio::time::timeout(ping_timeout, bus.ping())
            .await
            .map_err(|_| ExecutorError::Bus("ping timed out".to_string()))??;
        Ok(bus)
    }
}

#[async_trait]
impl Bus for RedisBus {
    async fn publish(&self, stream: &str, message: &CanonicalMessage) -> Result<(), ExecutorError> {
        let data = message
            .to_json()
            .map_err(|e| ExecutorError::Encoding(e.to_string()))?;
        let mut conn = self.conn.clone();
        let _id: String = conn
            .xadd(stream, "*", &[("data", data.as_str())])
            .await
            .map_err(|e| ExecutorError::Bus(e.to_string()))?;
        debug!(stream, "published canonical message");
        Ok(())
    }

    async fn ping(&self) -> Result<(), ExecutorError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ExecutorError::Bus(e.to_string()))?;
        Ok(())
    }
}
