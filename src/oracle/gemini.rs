//! Gemini oracle client
//!
//! Calls the Generative Language REST API, trying each model in the
//! configured fallback list until one answers or the retry budget is
//! spent.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::OracleClient;
use crate::config::EngineConfig;
use crate::error::{OracleError, OracleResult};

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    retry_budget: usize,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: String,
        models: Vec<String>,
        retry_budget: usize,
    ) -> Self {
        Self {
            api_key,
            base_url,
            models,
            retry_budget,
            client: reqwest::Client::new(),
        }
    }

    /// Build from engine config. `None` when no API key is configured,
    /// which forces the engine onto its deterministic path.
    pub fn from_config(config: &EngineConfig) -> Option<Self> {
        config.oracle_api_key.as_ref().map(|key| {
            Self::new(
                key.clone(),
                config.oracle_base_url.clone(),
                config.oracle_models.clone(),
                config.oracle_retry_budget,
            )
        })
    }

    async fn call_model(&self, model: &str, prompt: &str) -> OracleResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "contents": [{"parts": [{"text": prompt}]}]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status, body });
        }

        #[derive(Deserialize)]
        struct Part {
            text: Option<String>,
        }
        #[derive(Deserialize)]
        struct Content {
            parts: Option<Vec<Part>>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            candidates: Option<Vec<Candidate>>,
        }

        let api_response: ApiResponse = response.json().await?;
        api_response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| OracleError::EmptyResponse {
                model: model.to_string(),
            })
    }
}

#[async_trait]
impl OracleClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> OracleResult<String> {
        let mut attempts = 0;
        for model in &self.models {
            if attempts >= self.retry_budget {
                break;
            }
            attempts += 1;
            match self.call_model(model, prompt).await {
                Ok(text) => {
                    info!("Generated oracle response using {}", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Oracle model {} failed: {}", model, e);
                }
            }
        }
        Err(OracleError::Exhausted { attempts })
    }

    fn model_name(&self) -> &str {
        self.models.first().map(|m| m.as_str()).unwrap_or("unknown")
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}
