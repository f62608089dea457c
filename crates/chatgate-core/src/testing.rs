//! In-memory engines for tests.
//!
//! Enabled for this crate's own tests and, through the `test-utils`
//! feature, for adapter crates that need a deterministic engine.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::{CompletionOutput, GenerationSnapshot, RequestId, SamplingParams};
use crate::ports::{EngineError, InferenceEngine, SnapshotStream};

/// Arguments of one `generate` call.
pub type RecordedCall = (String, SamplingParams, RequestId);

/// Engine that replays a fixed list of cumulative texts.
#[derive(Debug)]
pub struct ScriptedEngine {
    steps: Vec<String>,
    fail_after: Option<usize>,
    unavailable: bool,
    calls: AtomicUsize,
    last_call: Mutex<Option<RecordedCall>>,
    aborted: Mutex<Vec<RequestId>>,
}

impl ScriptedEngine {
    /// Replay `steps` as successive snapshots of candidate 0.
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            fail_after: None,
            unavailable: false,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
            aborted: Mutex::new(Vec::new()),
        }
    }

    /// Engine whose `generate` and `health` fail as if unreachable.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Yield `n` snapshots, then an internal error.
    #[must_use]
    pub const fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.last_call.lock().unwrap().clone()
    }

    /// Request ids passed to `abort`, in call order.
    pub fn aborted(&self) -> Vec<RequestId> {
        self.aborted.lock().unwrap().clone()
    }

    fn snapshots(&self, request_id: &RequestId) -> Vec<Result<GenerationSnapshot, EngineError>> {
        let last = self.steps.len().saturating_sub(1);
        let mut items: Vec<_> = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut output = CompletionOutput::new(0, text.clone());
                if i == last {
                    output = output.finished("stop");
                }
                Ok(GenerationSnapshot::new(request_id.clone(), vec![output], i == last))
            })
            .collect();

        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(EngineError::Internal("scripted failure".to_string())));
        }
        items
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
        request_id: &RequestId,
    ) -> Result<SnapshotStream, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((prompt.to_string(), *params, request_id.clone()));

        if self.unavailable {
            return Err(EngineError::Unavailable("scripted engine is down".to_string()));
        }

        Ok(Box::pin(futures_util::stream::iter(self.snapshots(request_id))))
    }

    fn abort(&self, request_id: &RequestId) {
        self.aborted.lock().unwrap().push(request_id.clone());
    }

    async fn health(&self) -> Result<(), EngineError> {
        if self.unavailable {
            Err(EngineError::Unavailable("scripted engine is down".to_string()))
        } else {
            Ok(())
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
