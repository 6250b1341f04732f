use super::error::ParseError;
use regex::Regex;
use tracing::debug;

/// Extracts the inner text of the first fenced code block.
///
/// The opening fence may carry a language tag (```` ```json ````) or none.
pub fn extract_fenced_block(text: &str) -> Result<String, ParseError> {
    let regex = Regex::new(r"(?s)```[ \t]*[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)```")
        .map_err(|e| ParseError::JsonParsingFailed(format!("Failed to compile regex: {}", e)))?;

    if let Some(captures) = regex.captures(text)
        && let Some(content) = captures.get(1)
    {
        let inner = content.as_str().trim();
        if !inner.is_empty() {
            return Ok(inner.to_string());
        }
    }

    debug!(target: "speech_insight::parser", "No fenced block in response");
    Err(ParseError::NoFencedBlock)
}

/// Returns the substring from the first `{` to the last `}` inclusive.
pub fn extract_brace_span(text: &str) -> Result<&str, ParseError> {
    if let Some(start) = text.find('{')
        && let Some(end) = text.rfind('}')
        && end > start
    {
        return Ok(&text[start..=end]);
    }

    Err(ParseError::NoBraceSpan)
}

/// Replaces single quotes that are not escaped with double quotes.
pub fn replace_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous = None;

    for ch in text.chars() {
        if ch == '\'' && previous != Some('\\') {
            out.push('"');
        } else {
            out.push(ch);
        }
        previous = Some(ch);
    }

    out
}

/// Removes commas that directly precede a closing brace or bracket.
pub fn strip_trailing_commas(text: &str) -> String {
    match Regex::new(r",(\s*[}\]])") {
        Ok(regex) => regex.replace_all(text, "$1").into_owned(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_block_with_language() {
        let text = "Sure:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_fenced_block(text).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fenced_block_without_language() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_fenced_block(text).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fenced_block_inline() {
        let text = "```json {\"a\": 1} ```";
        assert_eq!(extract_fenced_block(text).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fenced_block_missing() {
        assert_eq!(
            extract_fenced_block("no fences here"),
            Err(ParseError::NoFencedBlock)
        );
    }

    #[test]
    fn test_extract_brace_span_uses_first_and_last_brace() {
        let text = "Result: {\"outer\": {\"inner\": 1}} thanks";
        assert_eq!(
            extract_brace_span(text).unwrap(),
            "{\"outer\": {\"inner\": 1}}"
        );
    }

    #[test]
    fn test_extract_brace_span_rejects_reversed_braces() {
        assert_eq!(extract_brace_span("} then {"), Err(ParseError::NoBraceSpan));
        assert_eq!(extract_brace_span("nothing"), Err(ParseError::NoBraceSpan));
    }

    #[test]
    fn test_replace_single_quotes_keeps_escaped() {
        assert_eq!(replace_single_quotes("{'a': 'b'}"), "{\"a\": \"b\"}");
        assert_eq!(replace_single_quotes(r"it\'s"), r"it\'s");
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(
            strip_trailing_commas("{\"a\": [1, 2,], \"b\": 3,\n}"),
            "{\"a\": [1, 2], \"b\": 3\n}"
        );
    }
}
