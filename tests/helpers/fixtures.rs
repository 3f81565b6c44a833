//! Shared fixtures: a scripted oracle and a small SAFE-style document.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docfill::config::EngineConfig;
use docfill::engine::FillEngine;
use docfill::error::{OracleError, OracleResult};
use docfill::oracle::OracleClient;

/// Replays canned responses in order; panics when called past the script.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, ()>>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<String, ()>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OracleClient for ScriptedOracle {
    async fn generate(&self, _prompt: &str) -> OracleResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) => Err(OracleError::Exhausted { attempts: 1 }),
            None => panic!("oracle called more often than scripted"),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

pub const SAFE_TEXT: &str = "SIMPLE AGREEMENT FOR FUTURE EQUITY\n\
This agreement is between [COMPANY NAME] and [INVESTOR NAME].\n\
The purchase amount is $_____________ payable on the effective date.";

/// Detection output for [`SAFE_TEXT`]: three fields in document order.
pub fn detection_json() -> String {
    serde_json::json!([
        {
            "name": "company_name",
            "description": "The company entering the agreement",
            "type": "party_name",
            "required": true,
            "source_excerpt": "[COMPANY NAME]"
        },
        {
            "name": "investor_name",
            "description": "The investor's legal name",
            "type": "party_name",
            "required": true,
            "source_excerpt": "[INVESTOR NAME]"
        },
        {
            "name": "purchase_amount",
            "description": "Amount paid for the SAFE",
            "type": "money",
            "required": true,
            "source_excerpt": "$_____________"
        }
    ])
    .to_string()
}

pub fn accept_json(value: &str) -> String {
    judgment_json("ANSWER", None, Some(value), true, true, "Saved!")
}

pub fn accept_for(value: &str, target: &str) -> String {
    judgment_json("ANSWER", Some(target), Some(value), true, true, "")
}

pub fn edit_json(target: &str, message: &str) -> String {
    judgment_json("EDIT_FIELD", Some(target), None, false, false, message)
}

pub fn clarify_json(message: &str) -> String {
    judgment_json("UNCLEAR", None, None, false, false, message)
}

pub fn judgment_json(
    intent: &str,
    target: Option<&str>,
    value: Option<&str>,
    is_valid: bool,
    should_accept: bool,
    message: &str,
) -> String {
    serde_json::json!({
        "intent": intent,
        "target_field": target,
        "extracted_value": value,
        "is_valid": is_valid,
        "should_accept": should_accept,
        "reasoning": "scripted",
        "assistant_message": message,
    })
    .to_string()
}

pub fn engine_with(replies: Vec<Result<String, ()>>, data_dir: &Path) -> FillEngine {
    let (engine, _) = engine_and_oracle(replies, data_dir);
    engine
}

pub fn engine_and_oracle(
    replies: Vec<Result<String, ()>>,
    data_dir: &Path,
) -> (FillEngine, Arc<ScriptedOracle>) {
    let config = EngineConfig {
        data_dir: data_dir.to_path_buf(),
        ..EngineConfig::default()
    };
    let oracle = ScriptedOracle::new(replies);
    let engine = FillEngine::with_oracle(config, Some(oracle.clone()));
    (engine, oracle)
}
