//! docfill - conversational placeholder filling for template documents
//!
//! The engine detects blank fields in a template (an LLM proposes the field
//! list), collects values for them over a multi-turn chat, and materializes
//! the filled document plus an HTML preview. Every accepted value is written
//! to an answer ledger keyed by session, never into the document text, so a
//! render at any point is a pure function of the template and the ledger.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docfill::{DocumentText, EngineConfig, FillEngine};
//!
//! # async fn demo() -> Result<(), docfill::FillError> {
//! let engine = FillEngine::new(EngineConfig::default());
//! let record = engine
//!     .register_document("nda.txt", DocumentText::from_plain_text("Between [PARTY A] and ___."))
//!     .await;
//! let session = engine.create_session(record.id).await?;
//! let reply = engine.process_turn(session.id, "Acme Corporation").await?;
//! println!("{}", reply.assistant);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Domain types and configuration
pub mod config;
pub mod model;

// Document text, span location and materialization
pub mod document;

// Field ordering, answer storage, echo guard
pub mod guard;
pub mod ledger;
pub mod registry;

// LLM oracle: client, prompts, judgment parsing
pub mod oracle;

// Field detection over document text
pub mod analysis;

// Turn resolution: field selection, intent, commit
pub mod resolver;

// In-memory stores and the engine facade
pub mod engine;
pub mod store;

// REST API (when enabled)
#[cfg(feature = "server")]
pub mod api;

// Public re-exports for the common path
pub use config::EngineConfig;
pub use document::DocumentText;
pub use engine::{FillEngine, RenderOutput, TurnReply};
pub use error::{FillError, FillResult};
pub use model::{Field, FieldKind, FillSession, Progress};
