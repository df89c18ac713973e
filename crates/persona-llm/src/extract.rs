//! Best-effort extraction of structured JSON from raw completions.
//!
//! Models asked for JSON routinely wrap it in markdown fences, prefix
//! it with prose, or get cut off at the token limit mid-structure. A
//! full regeneration is expensive, so when a direct parse fails this
//! module repairs the text structurally: it keeps the longest balanced
//! structure it can find, or closes whatever was left open. Partial
//! structured data beats no data here — a truncated array comes back
//! shorter than intended but parseable.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Parse a raw completion into `T`, repairing malformed input if needed.
///
/// The happy path is a plain `serde_json` parse of the fence-stripped
/// text. On failure the repaired candidate is tried once; if that also
/// fails, the error from the *original* parse is returned, since it is
/// the more informative diagnostic.
///
/// A successful repair is surfaced as a `tracing` warning — the return
/// value alone does not distinguish a clean parse from a repaired one.
pub fn parse_json_response<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_fences(raw);

    let original_err = match serde_json::from_str(cleaned) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    if let Some(candidate) = repair(cleaned)
        && let Ok(value) = serde_json::from_str(&candidate)
    {
        tracing::warn!(
            discarded = cleaned.len().saturating_sub(candidate.len()),
            "recovered structured data from a malformed completion"
        );
        return Ok(value);
    }

    Err(Error::Json(original_err))
}

/// Strip one leading ```` ```json ```` / ```` ``` ```` marker and one
/// trailing fence. Only fences at the very start and end of the trimmed
/// text count — backticks embedded inside string values are untouched.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Produce a syntactically closed candidate from malformed JSON text.
///
/// Everything before the first `{` is noise and is discarded; with no
/// `{` at all there is nothing to anchor a repair on and `None` is
/// returned. The scan tracks string-literal state (with escape
/// lookahead, so `\"` never ends a string) and a stack of open
/// brackets:
///
/// - If the stack returns to empty at some closing bracket, the text
///   through the *last* such position is a complete top-level structure
///   and any tail after it is dropped.
/// - Otherwise the text ends mid-structure: a still-open string is
///   closed with `"`, then the open brackets are closed innermost-first.
fn repair(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let body = &text[start..];

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut last_complete: Option<usize> = None;

    for (idx, ch) in body.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                // A stray closer with nothing open is tail garbage, not
                // the end of a structure.
                if stack.pop().is_some() && stack.is_empty() {
                    last_complete = Some(idx);
                }
            }
            _ => {}
        }
    }

    if let Some(end) = last_complete {
        return Some(body[..=end].to_string());
    }

    let mut candidate = body.to_string();
    if in_string {
        // Truncation right after a backslash would make the appended
        // quote look escaped; drop the unpaired backslash first.
        if escaped {
            candidate.pop();
        }
        candidate.push('"');
    }
    while let Some(closer) = stack.pop() {
        candidate.push(closer);
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{parse_json_response, strip_fences};

    fn parse(raw: &str) -> Value {
        parse_json_response(raw).expect("parseable after repair")
    }

    #[test]
    fn clean_json_parses_directly() {
        assert_eq!(parse(r#"{"a": 1, "b": [true, null]}"#), json!({"a": 1, "b": [true, null]}));
    }

    #[test]
    fn fenced_block_equals_unfenced_inner_text() {
        let inner = r#"{"segments": ["gen-z", "parents"], "count": 2}"#;
        let fenced = format!("```json\n{inner}\n```");
        let bare: Value = parse(inner);
        assert_eq!(parse(&fenced), bare);
        assert_eq!(parse(&format!("```\n{inner}\n```")), bare);
    }

    #[test]
    fn round_trip_through_fence() {
        let original = json!({
            "pains": [{"label": "time", "severity": 3}, {"label": "cost", "severity": 5}],
            "summary": "two pains"
        });
        let fenced = format!("```json\n{original}\n```");
        assert_eq!(parse(&fenced), original);
    }

    #[test]
    fn backticks_inside_string_values_survive() {
        let raw = r#"{"code": "use ```rust``` fences"}"#;
        assert_eq!(parse(raw), json!({"code": "use ```rust``` fences"}));
    }

    #[test]
    fn truncated_mid_string_closes_innermost_first() {
        // Two open containers and one open string: the string is closed
        // first, then `}` for the object, then `]`, then the outer `}`.
        assert_eq!(
            parse(r#"{"a": [1,2,{"b": "x"#),
            json!({"a": [1, 2, {"b": "x"}]})
        );
    }

    #[test]
    fn truncated_mid_array_yields_shorter_array() {
        let value = parse(r#"{"triggers": ["fomo", "scarcity", "soc"#);
        assert_eq!(value, json!({"triggers": ["fomo", "scarcity", "soc"]}));
    }

    #[test]
    fn garbage_tail_after_balanced_object_is_dropped() {
        assert_eq!(
            parse(r#"{"a":1} some trailing commentary"#),
            json!({"a": 1})
        );
    }

    #[test]
    fn stray_closers_in_the_tail_are_not_structure() {
        assert_eq!(parse(r#"{"a":1} }]"#), json!({"a": 1}));
    }

    #[test]
    fn leading_prose_before_first_brace_is_dropped() {
        assert_eq!(
            parse(r#"Here is the JSON you asked for: {"ok": true}"#),
            json!({"ok": true})
        );
    }

    #[test]
    fn no_brace_at_all_returns_the_original_error() {
        let err = parse_json_response::<Value>("the model refused to answer").unwrap_err();
        // The diagnostic must come from the original parse attempt.
        assert!(matches!(err, crate::Error::Json(_)));
    }

    #[test]
    fn escaped_quotes_do_not_end_the_string_scan() {
        assert_eq!(
            parse(r#"{"a": "say \"hi\"""#),
            json!({"a": "say \"hi\""})
        );
    }

    #[test]
    fn escaped_backslash_before_quote_still_ends_the_string() {
        // `"x\\"` is a complete string; the scanner must not treat the
        // closing quote as escaped.
        assert_eq!(parse(r#"{"a": "x\\", "b": [1"#), json!({"a": "x\\", "b": [1]}));
    }

    #[test]
    fn truncation_on_a_bare_backslash_still_recovers() {
        // The cut landed mid-escape-sequence; the dangling backslash
        // must not swallow the closing quote.
        assert_eq!(parse(r#"{"a": "x\"#), json!({"a": "x"}));
        assert_eq!(
            parse(r#"{"pains": ["cost", "time\"#),
            json!({"pains": ["cost", "time"]})
        );
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        assert_eq!(
            parse(r#"{"a": "{[not structure]}", "b": 1"#),
            json!({"a": "{[not structure]}", "b": 1})
        );
    }

    #[test]
    fn typed_deserialization_works_through_repair() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Segment {
            name: String,
            score: u32,
        }

        let raw = "```json\n{\"name\": \"early adopters\", \"score\": 9";
        let segment: Segment = parse_json_response(raw).expect("typed parse");
        assert_eq!(
            segment,
            Segment {
                name: "early adopters".to_string(),
                score: 9
            }
        );
    }

    #[test]
    fn strip_fences_only_touches_the_edges() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {}  "), "{}");
        // A lone leading fence without a trailing one still strips.
        assert_eq!(strip_fences("```json\n{}"), "{}");
    }
}
