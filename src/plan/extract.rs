//! Locate the JSON object inside free-form model output.
//!
//! Models wrap JSON in prose or markdown fences despite being told not to.
//! Both strategies here are heuristics; anything they cannot find is passed
//! through untouched so the parser reports a real error.

use std::str::FromStr;

/// How to cut the JSON candidate out of raw model text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// First `{` to last `}`.
    #[default]
    BraceSpan,
    /// First balanced `{...}` block that parses as JSON.
    Balanced,
}

impl ExtractionStrategy {
    pub fn extract<'a>(&self, raw: &'a str) -> &'a str {
        match self {
            ExtractionStrategy::BraceSpan => extract_json(raw),
            ExtractionStrategy::Balanced => extract_balanced_json(raw),
        }
    }
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brace-span" | "brace_span" | "span" => Ok(ExtractionStrategy::BraceSpan),
            "balanced" => Ok(ExtractionStrategy::Balanced),
            other => Err(format!(
                "unknown extraction strategy '{}' (expected 'brace-span' or 'balanced')",
                other
            )),
        }
    }
}

/// Greedy brace span: the substring from the first `{` through the last `}`.
///
/// Returns `raw` unchanged when there is no such span. Braces in prose
/// around the object widen the span and break the parse.
pub fn extract_json(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    }
}

/// First complete, balanced object that is valid JSON.
///
/// Scans from each `{` in turn, tracking nesting depth while skipping
/// braces inside string literals. Falls back to [`extract_json`] when no
/// candidate parses.
pub fn extract_balanced_json(raw: &str) -> &str {
    for (start, _) in raw.match_indices('{') {
        if let Some(end) = balanced_end(&raw[start..]) {
            let candidate = &raw[start..start + end];
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return candidate;
            }
        }
    }
    extract_json(raw)
}

/// Byte length of the balanced object at the start of `s`, if it closes.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
