// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output-shape parsing for gateway operations.
//!
//! Models occasionally wrap output in markdown code fences or append
//! punctuation to closed-set tokens; both are tolerated here. Anything
//! beyond that is a shape violation reported to the caller.

/// Strips a surrounding markdown code fence, including an optional
/// language tag on the first line.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let inner = trimmed.trim_matches('`').trim();
    match inner.split_once('\n') {
        Some((first, rest))
            if matches!(
                first.trim().to_lowercase().as_str(),
                "json" | "sql" | "text" | "javascript" | "js"
            ) =>
        {
            rest.trim().to_string()
        }
        _ => inner.to_string(),
    }
}

/// Parses a single token from a closed set, case-insensitively,
/// tolerating trailing sentence punctuation.
pub fn parse_closed_token<'a>(text: &str, allowed: &[&'a str]) -> Result<&'a str, String> {
    let cleaned = strip_code_fences(text);
    let token = cleaned.trim().trim_end_matches(['.', '!']).trim().to_uppercase();
    allowed
        .iter()
        .find(|candidate| token == **candidate)
        .copied()
        .ok_or_else(|| format!("expected one of {allowed:?}, got {token:?}"))
}

/// Parses a JSON object and extracts a required non-empty string field.
pub fn extract_string_field(text: &str, field: &str) -> Result<String, String> {
    let cleaned = strip_code_fences(text);
    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| format!("output is not valid JSON: {e}"))?;
    let extracted = value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| format!("missing string field {field:?}"))?;
    if extracted.trim().is_empty() {
        return Err(format!("field {field:?} is empty"));
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_plain_text_unchanged() {
        assert_eq!(strip_code_fences("  hello  "), "hello");
    }

    #[test]
    fn strip_fence_without_language() {
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn strip_fence_with_json_tag() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn strip_fence_with_sql_tag() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT 1\n```"),
            "SELECT 1"
        );
    }

    #[test]
    fn token_exact_match() {
        assert_eq!(
            parse_closed_token("STRUCTURED", &["STRUCTURED", "HYBRID"]).unwrap(),
            "STRUCTURED"
        );
    }

    #[test]
    fn token_case_insensitive_with_period() {
        assert_eq!(
            parse_closed_token("hybrid.", &["STRUCTURED", "HYBRID"]).unwrap(),
            "HYBRID"
        );
    }

    #[test]
    fn token_rejects_extra_words() {
        assert!(parse_closed_token("I choose HYBRID", &["HYBRID"]).is_err());
    }

    #[test]
    fn token_rejects_unknown() {
        let err = parse_closed_token("MAYBE", &["REUSE", "REFRESH"]).unwrap_err();
        assert!(err.contains("MAYBE"));
    }

    #[test]
    fn extract_field_happy_path() {
        let out = extract_string_field(r#"{"answer": "42 incidents."}"#, "answer").unwrap();
        assert_eq!(out, "42 incidents.");
    }

    #[test]
    fn extract_field_from_fenced_json() {
        let out = extract_string_field(
            "```json\n{\"query\": \"SELECT COUNT(*) FROM incident_reports\"}\n```",
            "query",
        )
        .unwrap();
        assert!(out.starts_with("SELECT"));
    }

    #[test]
    fn extract_field_missing() {
        assert!(extract_string_field(r#"{"other": "x"}"#, "answer").is_err());
    }

    #[test]
    fn extract_field_not_json() {
        assert!(extract_string_field("here is your answer", "answer").is_err());
    }

    #[test]
    fn extract_field_empty_rejected() {
        assert!(extract_string_field(r#"{"answer": "  "}"#, "answer").is_err());
    }
}
