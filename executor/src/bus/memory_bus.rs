//! In-memory [`Bus`] double: records every publish for assertion in
//! tests, never touches the network.

use std::sync::Arc;

use async_trait::async_trait;
use core_types::CanonicalMessage;
use tokio::sync::Mutex;

use crate::types::{Bus, ExecutorError};

#[derive(Clone, Default)]
pub struct InMemoryBus {
    published: Arc<Mutex<Vec<(String, CanonicalMessage)>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<(String, CanonicalMessage)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn publish(&self, stream: &str, message: &CanonicalMessage) -> Result<(), ExecutorError> {
        self.published
            .lock()
            .await
            .push((stream.to_string(), message.clone()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), ExecutorError> {
        Ok(())
    }
}
