//! langflow: a small client library for hosted Langflow run endpoints.
//! Covers the run-request envelope, the HTTP client, and extraction of the
//! final reply text from a run's nested output tree.

pub mod api;
pub mod client;
pub mod extract;

// Re-export the types callers actually touch
pub use api::RunRequest;
pub use client::{LangflowClient, LangflowError};
pub use extract::extract_last_text;

pub const CHAT_INPUT_TYPE: &str = "chat";
pub const CHAT_OUTPUT_TYPE: &str = "chat";
