//! Interpretation of raw model replies.
//!
//! The external service is untrusted text: replies often arrive wrapped in
//! markdown code fences. Nothing here validates the query semantically.

/// Strip markdown code fences and surrounding whitespace from a model reply.
///
/// Handles:
/// - ```sql ... ```
/// - ```SQL ... ```
/// - ``` ... ```
///
/// Idempotent: stripping an already-bare string is a no-op.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();

    if !text.starts_with("```") {
        return text.to_string();
    }

    // Drop the opening fence line, language tag included
    let body = match text.find('\n') {
        Some(i) => &text[i + 1..],
        None => return text.trim_matches('`').trim().to_string(),
    };

    // Drop the closing fence when present
    let body = match body.rfind("```") {
        Some(i) => &body[..i],
        None => body,
    };

    body.trim().to_string()
}
