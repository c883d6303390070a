//! Counter Client - best-effort hit counter
//!
//! Nothing depends on these calls succeeding. Failures are logged at debug
//! level and turn into `None`.

use serde::Deserialize;

use crate::config::CounterConfig;
use crate::error::{BadgeError, Result};

#[derive(Debug, Deserialize)]
struct CounterReply {
    value: i64,
}

#[derive(Debug, Clone)]
pub struct CounterClient {
    client: reqwest::Client,
    config: CounterConfig,
}

impl CounterClient {
    pub fn new(client: reqwest::Client, config: CounterConfig) -> Self {
        Self { client, config }
    }

    pub fn info_url(&self) -> String {
        self.url("info")
    }

    pub fn hit_url(&self) -> String {
        self.url("hit")
    }

    fn url(&self, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            action,
            self.config.namespace,
            self.config.key
        )
    }

    /// Current count, read-only.
    pub async fn fetch_count(&self) -> Option<i64> {
        if !self.config.enabled {
            return None;
        }
        self.get(&self.info_url()).await
    }

    /// Bump the count and return the new value.
    pub async fn increment_and_fetch(&self) -> Option<i64> {
        if !self.config.enabled {
            return None;
        }
        self.get(&self.hit_url()).await
    }

    async fn get(&self, url: &str) -> Option<i64> {
        match self.request(url).await {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("counter request {} failed: {}", url, e);
                None
            }
        }
    }

    async fn request(&self, url: &str) -> Result<i64> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BadgeError::Network(format!("HTTP {}", response.status())));
        }
        let reply: CounterReply = response.json().await?;
        Ok(reply.value)
    }
}
