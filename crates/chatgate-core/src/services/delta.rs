//! Cumulative-text to delta conversion for streaming responses.

use tracing::warn;

use crate::domain::GenerationSnapshot;

/// Remembers what has already been emitted per candidate so that each
/// snapshot yields only its new suffix.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    emitted: Vec<String>,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// New text of candidate `index` given its cumulative `text`.
    ///
    /// Normally `text` extends what was emitted before and the result is
    /// the suffix. If the engine rewrote earlier text the suffix past the
    /// old length is returned (empty when that offset is not a character
    /// boundary), and tracking continues from `text`.
    pub fn delta<'a>(&mut self, index: usize, text: &'a str) -> &'a str {
        if self.emitted.len() <= index {
            self.emitted.resize_with(index + 1, String::new);
        }
        let previous = &mut self.emitted[index];

        let delta = if let Some(suffix) = text.strip_prefix(previous.as_str()) {
            suffix
        } else {
            warn!(
                index,
                previous_len = previous.len(),
                current_len = text.len(),
                "Engine output does not extend previously streamed text"
            );
            text.get(previous.len()..).unwrap_or("")
        };

        previous.clear();
        previous.push_str(text);
        delta
    }

    /// Concatenated new text of every candidate in `snapshot`, in order.
    pub fn advance(&mut self, snapshot: &GenerationSnapshot) -> String {
        let mut out = String::new();
        for output in &snapshot.outputs {
            out.push_str(self.delta(output.index, &output.text));
        }
        out
    }
}
