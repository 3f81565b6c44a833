//! NLU oracle
//!
//! The engine treats natural-language understanding as a black box behind
//! the `OracleClient` trait: one prompt in, raw model text out. Judgment
//! parsing is defensive and local validation always has the last word.

pub mod gemini;
pub mod judgment;
pub mod prompt;

use async_trait::async_trait;

use crate::error::OracleResult;

pub use gemini::GeminiClient;
pub use judgment::{extract_json_array, parse_verdict, TurnIntent, TurnJudgment, Verdict};
pub use prompt::{build_detection_prompt, build_turn_prompt, TurnPromptInput};

/// Black-box NLU oracle interface
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Send one prompt, return the raw model text
    async fn generate(&self, prompt: &str) -> OracleResult<String>;

    /// Primary model name for logging
    fn model_name(&self) -> &str;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}
