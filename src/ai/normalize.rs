//! Helpers adapters use to turn free-form model output into response fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::core::models::KeyQuote;
use crate::errors::ProviderError;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*\n?(.*?)\n?```$").expect("static regex compile")
});

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(summary|social post|post|blog post|article|quotes?)\s*:\s*")
        .expect("static regex compile")
});

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[?\(?(\d{1,2}:\d{2}(?::\d{2})?)\)?\]?\s*[-–—:]?\s*(.+)$")
        .expect("static regex compile")
});

static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*•]|\d+[.)])\s+")
        .expect("static regex compile")
});

const QUOTE_CHARS: &[char] = &['"', '\'', '“', '”', '‘', '’', '«', '»'];

/// Strip code fences, a leading field label and surrounding whitespace.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str())
        .trim();
    LABEL_RE.replace(unfenced, "").trim().to_string()
}

/// Clean `raw` and reject it if nothing is left.
pub fn require_text(raw: &str, what: &str) -> Result<String, ProviderError> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Err(ProviderError::MalformedResponse(format!(
            "Provider returned an empty {what}"
        )));
    }
    Ok(cleaned)
}

/// Shorten to at most `max_chars` characters, cutting at a word boundary when possible.
#[must_use]
pub fn clamp_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let budget = max_chars.saturating_sub(1).max(1);
    let head: String = text.chars().take(budget).collect();
    let cut = match head.rfind(char::is_whitespace) {
        Some(idx) if idx > budget / 2 => head[..idx].trim_end().to_string(),
        _ => head,
    };
    format!("{cut}…")
}

/// Parse a model reply listing quotes.
///
/// Accepts a JSON array of strings or `{text, timestamp}` objects (optionally
/// fenced or surrounded by prose), or one quote per line with optional list
/// markers and `[mm:ss]` prefixes. Returns at most `max_quotes` unique quotes.
pub fn parse_quotes(raw: &str, max_quotes: usize) -> Result<Vec<KeyQuote>, ProviderError> {
    let cleaned = clean_text(raw);
    let mut quotes = parse_json_quotes(&cleaned).unwrap_or_else(|| parse_line_quotes(&cleaned));

    let mut seen = std::collections::HashSet::new();
    quotes.retain(|q| !q.text.is_empty() && seen.insert(q.text.to_lowercase()));
    if max_quotes > 0 {
        quotes.truncate(max_quotes);
    }

    if quotes.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "Provider returned no usable quotes".to_string(),
        ));
    }
    Ok(quotes)
}

fn parse_json_quotes(text: &str) -> Option<Vec<KeyQuote>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    let items = value.as_array()?;

    let quotes = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(quote_from_line(s)),
            Value::Object(map) => {
                let body = ["text", "quote", "content"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))?;
                let timestamp = ["timestamp", "time", "ts"]
                    .iter()
                    .find_map(|k| map.get(*k))
                    .and_then(|v| match v {
                        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                        Value::Number(n) => n.as_f64().map(format_seconds),
                        _ => None,
                    });
                Some(KeyQuote {
                    text: strip_quote_marks(body),
                    timestamp,
                })
            }
            _ => None,
        })
        .collect();
    Some(quotes)
}

fn parse_line_quotes(text: &str) -> Vec<KeyQuote> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| LIST_MARKER_RE.replace(line, "").to_string())
        .map(|line| quote_from_line(&line))
        .collect()
}

fn quote_from_line(line: &str) -> KeyQuote {
    let line = line.trim();
    if let Some(caps) = TIMESTAMP_RE.captures(line)
        && let (Some(ts), Some(body)) = (caps.get(1), caps.get(2))
    {
        return KeyQuote::at(strip_quote_marks(body.as_str()), ts.as_str());
    }
    KeyQuote::new(strip_quote_marks(line))
}

fn strip_quote_marks(s: &str) -> String {
    s.trim().trim_matches(QUOTE_CHARS).trim().to_string()
}

/// Render seconds as `m:ss` or `h:mm:ss`.
#[must_use]
pub fn format_seconds(secs: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
