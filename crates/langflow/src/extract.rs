use serde_json::Value;

/// Extract the last message text from a Langflow run result.
///
/// A run result nests its node outputs two levels deep:
///
/// ```json
/// {"outputs": [{"outputs": [{"results": {"message": {"text": "..."}}}]}]}
/// ```
///
/// Only the final node's final output is the user-visible reply, so the walk
/// takes the last element at both levels and then follows
/// `results.message.text`. Every step is optional: a missing key, an empty
/// sequence, or a wrong shape anywhere short-circuits to `None` rather than
/// erroring. An empty terminal string is reported as `Some("")`; whether
/// that counts as "no output" is the caller's call.
pub fn extract_last_text(result: &Value) -> Option<&str> {
    let outer_last = result.get("outputs")?.as_array()?.last()?;
    let inner_last = outer_last.get("outputs")?.as_array()?.last()?;

    inner_last
        .get("results")?
        .get("message")?
        .get("text")?
        .as_str()
}
