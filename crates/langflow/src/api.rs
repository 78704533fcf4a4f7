use serde::{Deserialize, Serialize};

use crate::{CHAT_INPUT_TYPE, CHAT_OUTPUT_TYPE};

/// The request envelope a Langflow run endpoint accepts.
///
/// `input_type` and `output_type` select which node kinds of the flow the
/// value is wired into; for a chat proxy both are always `"chat"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub input_value: String,
    pub input_type: String,
    pub output_type: String,
    pub session_id: String,
}

impl RunRequest {
    /// Build a chat-typed envelope. `session_id` is opaque to the flow
    /// runner; it only scopes conversation memory upstream.
    pub fn chat(input_value: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            input_value: input_value.into(),
            input_type: CHAT_INPUT_TYPE.to_string(),
            output_type: CHAT_OUTPUT_TYPE.to_string(),
            session_id: session_id.into(),
        }
    }
}
