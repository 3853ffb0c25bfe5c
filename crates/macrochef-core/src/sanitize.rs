//! Extraction of the structured payload from a free-text generation reply.

use crate::error::{RecipeError, Result};
use crate::format::OutputFormat;

/// Return the substring from the first `open` to the last `close`, inclusive.
///
/// Conversational wrapper text before and after is discarded. The result is
/// not checked for well-formedness.
pub fn extract_between(raw: &str, open: char, close: char) -> Result<&str> {
    let start = raw.find(open);
    let end = raw.rfind(close);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(&raw[start..end + close.len_utf8()]),
        _ => Err(RecipeError::MalformedPayload {
            raw: raw.to_string(),
        }),
    }
}

/// Extract the payload for the given output format.
pub fn sanitize(raw: &str, format: OutputFormat) -> Result<String> {
    let (open, close) = format.delimiters();
    extract_between(raw, open, close).map(str::to_string)
}

/// Remove an echoed copy of the prompt from a reply.
///
/// Some completion backends return the input ahead of the completion; since the
/// prompt may itself contain structural delimiters it must go before extraction.
pub fn strip_echo<'a>(raw: &'a str, prompt: &str) -> std::borrow::Cow<'a, str> {
    if prompt.is_empty() || !raw.contains(prompt) {
        std::borrow::Cow::Borrowed(raw)
    } else {
        std::borrow::Cow::Owned(raw.replace(prompt, ""))
    }
}

/// Extract and parse the payload as JSON.
pub fn sanitize_json(raw: &str, format: OutputFormat) -> Result<serde_json::Value> {
    let payload = sanitize(raw, format)?;
    serde_json::from_str(&payload).map_err(|_| RecipeError::MalformedPayload {
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"[{"recipeName": "Chicken Rice Bowl", "cookingProcess": ["Cook rice", "Grill chicken"]}]"#;

    #[test]
    fn test_strips_wrapper_text() {
        let raw = format!("Sure! Here are your recipes:\n{}\nEnjoy your meal.", PAYLOAD);
        assert_eq!(sanitize(&raw, OutputFormat::RecipeArray).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_bare_payload_unchanged() {
        assert_eq!(sanitize(PAYLOAD, OutputFormat::RecipeArray).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_object_delimiters() {
        let raw = "Here you go: {\"recipeName\": \"Soup\"} -- bon appetit";
        assert_eq!(
            sanitize(raw, OutputFormat::SingleRecipe).unwrap(),
            "{\"recipeName\": \"Soup\"}"
        );
    }

    #[test]
    fn test_missing_close_is_malformed() {
        let raw = "I could not produce recipes [sorry";
        match sanitize(raw, OutputFormat::RecipeArray) {
            Err(RecipeError::MalformedPayload { raw: carried }) => assert_eq!(carried, raw),
            other => panic!("expected MalformedPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_open_is_malformed() {
        assert!(matches!(
            sanitize("no structure here]", OutputFormat::RecipeArray),
            Err(RecipeError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_close_before_open_is_malformed() {
        assert!(matches!(
            sanitize("] then [", OutputFormat::RecipeArray),
            Err(RecipeError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_strip_echo() {
        let prompt = "Please generate 5 recipes. Structure: [ ... ]";
        let raw = format!("{}\n{}", prompt, PAYLOAD);
        let stripped = strip_echo(&raw, prompt);
        assert_eq!(sanitize(&stripped, OutputFormat::RecipeArray).unwrap(), PAYLOAD);

        assert_eq!(strip_echo(PAYLOAD, prompt), PAYLOAD);
    }

    #[test]
    fn test_sanitize_json() {
        let value = sanitize_json(&format!("ok: {}", PAYLOAD), OutputFormat::RecipeArray).unwrap();
        assert_eq!(value[0]["recipeName"], "Chicken Rice Bowl");

        assert!(sanitize_json("[not json]", OutputFormat::RecipeArray).is_err());
    }
}
