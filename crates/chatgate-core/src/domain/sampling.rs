//! Sampling parameters handed to the engine.

use serde::{Deserialize, Serialize};

use super::chat::ChatRequest;

/// Nucleus-sampling threshold applied to every request.
pub const DEFAULT_TOP_P: f32 = 0.9;

/// Engine sampling configuration for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl From<&ChatRequest> for SamplingParams {
    fn from(req: &ChatRequest) -> Self {
        Self {
            temperature: req.temperature,
            top_p: DEFAULT_TOP_P,
            max_tokens: req.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_p_is_fixed() {
        let params = SamplingParams::from(
            &ChatRequest::new("Hi")
                .with_temperature(1.3)
                .with_max_tokens(5),
        );
        assert_eq!(params.temperature, 1.3);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.max_tokens, 5);
    }
}
