use dictate_foundation::error::TransportError;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Caches the most recently fetched auth token in memory (spec §4.3 step 1).
/// `dictate-app` is expected to call `refresh` opportunistically in the
/// background; `get_or_fetch` only hits the network on a cache miss.
#[derive(Clone)]
pub struct TokenCache {
    cached: Arc<RwLock<Option<String>>>,
    client: reqwest::Client,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            cached: Arc::new(RwLock::new(None)),
            client: reqwest::Client::new(),
        }
    }

    pub fn cached(&self) -> Option<String> {
        self.cached.read().clone()
    }

    /// Fetches `GET {api_base_url}/api/ws-token` and stores the result,
    /// regardless of whether a cached value already existed.
    pub async fn refresh(&self, api_base_url: &str) -> Result<String, TransportError> {
        let url = format!("{}/api/ws-token", api_base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::TokenFetchFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(TransportError::TokenFetchFailed(format!(
                "status {}",
                resp.status()
            )));
        }
        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| TransportError::TokenFetchFailed(e.to_string()))?;
        *self.cached.write() = Some(body.token.clone());
        Ok(body.token)
    }

    /// Cache hit returns immediately; a miss fetches synchronously (spec
    /// §4.3 step 1).
    pub async fn get_or_fetch(&self, api_base_url: &str) -> Result<String, TransportError> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }
        self.refresh(api_base_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_no_cached_token() {
        let cache = TokenCache::new();
        assert_eq!(cache.cached(), None);
    }

    #[tokio::test]
    async fn get_or_fetch_returns_cached_without_network() {
        let cache = TokenCache::new();
        *cache.cached.write() = Some("cached-token".to_string());
        let token = cache.get_or_fetch("http://127.0.0.1:1").await.unwrap();
        assert_eq!(token, "cached-token");
    }
}
