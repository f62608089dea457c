//! [`InferenceEngine`] backed by an OpenAI-compatible completions server.
//!
//! Works against a managed `vllm serve` process or any external server
//! exposing `POST /v1/completions` with `stream: true` and `GET /health`.

mod sse;
mod wire;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatgate_core::{EngineError, InferenceEngine, RequestId, SamplingParams, SnapshotStream};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use wire::{CompletionRequest, error_message};

/// Header carrying the request id to the engine for log correlation.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// In-flight generations by slot. Request ids may repeat across clients,
/// so each `generate` call owns its own slot.
type InflightMap = Arc<Mutex<HashMap<u64, (RequestId, CancellationToken)>>>;

/// Connection settings for [`OpenAiEngine`].
#[derive(Debug, Clone)]
pub struct OpenAiEngineConfig {
    /// Server root, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Model name sent with every request; must match what the server serves.
    pub model: String,
    pub connect_timeout: Duration,
}

impl OpenAiEngineConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Engine client speaking the OpenAI completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiEngine {
    client: Client,
    base_url: String,
    model: String,
    inflight: InflightMap,
    next_slot: Arc<AtomicU64>,
}

impl OpenAiEngine {
    /// Build a client. No request is made until the first call.
    pub fn new(config: OpenAiEngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| EngineError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            inflight: Arc::default(),
            next_slot: Arc::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of generations currently streaming.
    pub fn inflight(&self) -> usize {
        self.inflight.lock().map_or(0, |map| map.len())
    }

    fn register(&self, request_id: &RequestId) -> (CancellationToken, InflightGuard) {
        let token = CancellationToken::new();
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut map) = self.inflight.lock() {
            map.insert(slot, (request_id.clone(), token.clone()));
        }
        let guard = InflightGuard {
            map: Arc::clone(&self.inflight),
            slot,
        };
        (token, guard)
    }
}

#[async_trait]
impl InferenceEngine for OpenAiEngine {
    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
        request_id: &RequestId,
    ) -> Result<SnapshotStream, EngineError> {
        let url = format!("{}/v1/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stream: true,
        };

        let (cancel, guard) = self.register(request_id);
        debug!(request_id = %request_id, url = %url, "Forwarding completion to engine");

        let response = self
            .client
            .post(&url)
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach inference engine: {e}");
                EngineError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Engine rejected completion request");
            return Err(EngineError::Upstream {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(Box::pin(sse::snapshots(
            response.bytes_stream(),
            request_id.clone(),
            cancel,
            Some(guard),
        )))
    }

    /// Cancel the generation registered under `request_id`.
    ///
    /// When several live generations share the id, none is cancelled here:
    /// each stream closes its own upstream request when it is dropped.
    fn abort(&self, request_id: &RequestId) {
        let Ok(mut map) = self.inflight.lock() else {
            return;
        };
        let slots: Vec<u64> = map
            .iter()
            .filter(|(_, (id, _))| id == request_id)
            .map(|(slot, _)| *slot)
            .collect();

        match slots.as_slice() {
            [] => {}
            [slot] => {
                if let Some((_, token)) = map.remove(slot) {
                    debug!(request_id = %request_id, "Aborting engine request");
                    token.cancel();
                }
            }
            shared => {
                warn!(
                    request_id = %request_id,
                    generations = shared.len(),
                    "Request id is shared by concurrent generations, not aborting by id"
                );
            }
        }
    }

    async fn health(&self) -> Result<(), EngineError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::Upstream {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Frees a generation's slot in the in-flight table when its stream is
/// dropped.
#[derive(Debug)]
pub(crate) struct InflightGuard {
    map: InflightMap,
    slot: u64,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(&self.slot);
        }
    }
}
