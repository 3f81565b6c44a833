//! Document text model, span location and materialization

pub mod locator;
pub mod materializer;
pub mod text;

pub use locator::{locate, Span};
pub use materializer::{fill, render_preview, PreviewOptions};
pub use text::{DocumentText, TableText};
