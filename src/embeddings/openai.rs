use crate::cache::EmbeddingCache;
use crate::embeddings::Embedder;
use crate::error::{KgqaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Retries for a single query embedding on 429/5xx
const MAX_RETRIES: usize = 3;

/// Request structure for OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

/// Response structure from OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings client
///
/// Handles batch embedding generation with retry logic and rate limiting.
/// Optionally caches question embeddings to reduce API calls.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    batch_size: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `batch_size` - Maximum number of texts to send per API request (max 2048)
    pub fn new(api_key: String, model: String, batch_size: usize) -> Result<Self> {
        Self::new_with_cache(api_key, model, batch_size, None)
    }

    /// Create a new OpenAI embedder with an optional query-embedding cache
    pub fn new_with_cache(
        api_key: String,
        model: String,
        batch_size: usize,
        cache: Option<Arc<EmbeddingCache>>,
    ) -> Result<Self> {
        // Validate batch size doesn't exceed OpenAI limits
        let batch_size = batch_size.clamp(1, 2048);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KgqaError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            batch_size,
            cache,
        })
    }

    /// Embed a batch of texts, splitting into API-sized requests
    ///
    /// Returns one embedding per input text, in the same order.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.embed_batch_internal(chunk.to_vec()).await?;
            if embeddings.len() != chunk.len() {
                return Err(KgqaError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    embeddings.len()
                )));
            }
            all_embeddings.extend(embeddings);

            // Rate limiting: small delay between full batches
            if chunk.len() == self.batch_size {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        Ok(all_embeddings)
    }

    /// Make a single API request
    async fn embed_batch_internal(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts,
        };

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| KgqaError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(KgqaError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| KgqaError::Embedding(format!("Failed to parse response: {}", e)))?;

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Embed a single text, checking the cache first
    pub async fn embed_with_cache(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Cache hit for query: {}", text);
                return Ok(cached);
            }
        }

        let embedding = self.embed_with_retry(text, max_retries).await?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }

    /// Embed a single text with exponential backoff on 429/5xx (no caching)
    pub async fn embed_with_retry(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.embed_batch_internal(vec![text.to_string()]).await {
                Ok(mut embeddings) => {
                    if embeddings.is_empty() {
                        return Err(KgqaError::Embedding(
                            "Empty response from OpenAI API".to_string(),
                        ));
                    }
                    log::debug!(
                        "Embedding API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(embeddings.remove(0));
                }
                Err(e) if attempt < max_retries && is_retryable(&e) => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Rate limits and server errors are worth retrying
fn is_retryable(err: &KgqaError) -> bool {
    let msg = err.to_string();
    ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| msg.contains(code))
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_cache(text, MAX_RETRIES).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_texts(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_new() {
        let embedder = OpenAIEmbedder::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            100,
        )
        .unwrap();

        assert_eq!(embedder.model, "text-embedding-3-small");
        assert_eq!(embedder.batch_size, 100);
        assert!(embedder.cache.is_none());
    }

    #[test]
    fn test_embedder_batch_size_limit() {
        let embedder = OpenAIEmbedder::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            5000,
        )
        .unwrap();

        assert_eq!(embedder.batch_size, 2048);
    }

    #[test]
    fn test_embedder_batch_size_floor() {
        let embedder = OpenAIEmbedder::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            0,
        )
        .unwrap();

        assert_eq!(embedder.batch_size, 1);
    }

    #[tokio::test]
    async fn test_cached_query_skips_api() {
        let cache = Arc::new(EmbeddingCache::new(4));
        cache.put("Who has Flight?".to_string(), vec![0.5, 0.5]);
        let embedder = OpenAIEmbedder::new_with_cache(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            10,
            Some(Arc::clone(&cache)),
        )
        .unwrap();

        let v = embedder.embed("Who has Flight?").await.unwrap();
        assert_eq!(v, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embedder = OpenAIEmbedder::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            10,
        )
        .unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&KgqaError::Embedding("OpenAI API error 429 Too Many Requests".into())));
        assert!(is_retryable(&KgqaError::Embedding("OpenAI API error 503".into())));
        assert!(!is_retryable(&KgqaError::Embedding("OpenAI API error 401".into())));
    }

    // Live API calls need a real key and are not exercised here.
}
