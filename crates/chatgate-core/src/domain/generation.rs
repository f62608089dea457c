//! Incremental engine output.

use serde::{Deserialize, Serialize};

use super::request_id::RequestId;

/// One candidate completion inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutput {
    /// Candidate index (always 0 unless the engine samples several).
    pub index: usize,
    /// Cumulative generated text so far.
    pub text: String,
    /// Set once the engine stops generating this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl CompletionOutput {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            finish_reason: None,
        }
    }

    #[must_use]
    pub fn finished(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }
}

/// Cumulative state of one generation after an engine step.
///
/// Snapshots are produced lazily, in order, and each one supersedes the
/// previous: the text of every candidate is the full text so far, not a
/// delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    pub request_id: RequestId,
    pub outputs: Vec<CompletionOutput>,
    /// True on the last snapshot the engine will produce.
    pub finished: bool,
}

impl GenerationSnapshot {
    pub const fn new(request_id: RequestId, outputs: Vec<CompletionOutput>, finished: bool) -> Self {
        Self {
            request_id,
            outputs,
            finished,
        }
    }

    /// Text of the first candidate, or empty if the engine sent none yet.
    pub fn text(&self) -> &str {
        self.outputs.first().map_or("", |o| o.text.as_str())
    }
}
