//! Deterministic, network-free stand-in output used when no provider can
//! serve a request.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::ai::normalize::clamp_chars;
use crate::ai::provider::local_metadata;
use crate::core::models::{ContentType, KeyQuote, ProcessRequest, ProcessResponse, ResolvedOptions};

pub const FALLBACK_PROVIDER_ID: &str = "fallback";

/// Prefix marking every synthetic artifact.
pub const SYNTHETIC_MARKER: &str = "[Auto-generated placeholder]";

const MIN_QUOTE_CHARS: usize = 20;
const MAX_QUOTE_CHARS: usize = 240;

static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?\n]+[.!?]+").expect("static regex compile"));

/// Coarse topic buckets: (label, hashtag, keywords).
const TOPICS: &[(&str, &str, &[&str])] = &[
    ("remote work", "#RemoteWork", &["remote", "hybrid", "wfh", "distributed"]),
    (
        "artificial intelligence",
        "#AI",
        &["ai", "artificial", "machine", "llm", "neural", "model"],
    ),
    ("climate and sustainability", "#Sustainability", &["climate", "carbon", "emissions", "sustainability", "energy"]),
    ("business and startups", "#Startups", &["startup", "founder", "funding", "revenue", "business"]),
    ("personal finance and markets", "#Finance", &["market", "invest", "stock", "finance", "inflation"]),
    ("health and wellbeing", "#Wellbeing", &["health", "fitness", "sleep", "wellbeing", "mental"]),
    ("productivity", "#Productivity", &["productivity", "focus", "habits", "workflow", "time"]),
    ("software development", "#SoftwareDevelopment", &["code", "software", "developer", "programming", "rust"]),
];

const GENERAL_TOPIC: (&str, &str) = ("the subject at hand", "#Insights");

#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build a clearly-labeled response from request data alone.
    ///
    /// `text` is the resolved content when resolution succeeded. Identical
    /// inputs produce identical output apart from `processed_at`.
    #[must_use]
    pub fn synthesize(
        &self,
        request: &ProcessRequest,
        text: Option<&str>,
        options: &ResolvedOptions,
    ) -> ProcessResponse {
        let body = text
            .or_else(|| request.inline_content())
            .unwrap_or("")
            .trim();
        let (topic, hashtag) = detect_topic(body, request.source());
        let metadata = local_metadata(request.source(), request.content_type, body);

        let summary = self.summary(request, body, topic, options.max_summary_length);
        let key_quotes = self.quotes(body, options.max_quotes);
        let social_post = self.social_post(&metadata.title, topic, hashtag, &options.social_tone);
        let blog_post = options
            .generate_blog
            .then(|| self.blog_post(&metadata.title, topic, &summary, &key_quotes));

        ProcessResponse {
            summary,
            key_quotes,
            social_post,
            blog_post,
            content_metadata: metadata,
            is_real_ai_content: false,
            is_mock_fallback: true,
            provider_id: FALLBACK_PROVIDER_ID.to_string(),
            processed_at: Utc::now(),
        }
    }

    fn summary(&self, request: &ProcessRequest, body: &str, topic: &str, max_len: usize) -> String {
        let words = body.split_whitespace().count();
        let lead = match request.content_type {
            ContentType::Text if words > 0 => {
                format!("This {words}-word text discusses {topic}.")
            }
            ContentType::Text => format!("This text discusses {topic}."),
            ContentType::Link => {
                let host = request
                    .source()
                    .and_then(|s| Url::parse(s).ok())
                    .and_then(|u| u.host_str().map(ToString::to_string))
                    .unwrap_or_else(|| "the linked page".to_string());
                format!("This article from {host} covers {topic}.")
            }
            ContentType::Video | ContentType::Transcript => {
                format!("This video explores {topic}.")
            }
            ContentType::Audio => format!("This audio recording talks about {topic}."),
        };

        let opening = first_sentences(body, 1)
            .into_iter()
            .next()
            .map(|s| format!(" It opens with: \"{s}\""))
            .unwrap_or_default();

        let full = format!("{SYNTHETIC_MARKER} {lead}{opening}");
        let clamped = clamp_chars(&full, max_len.max(SYNTHETIC_MARKER.len() + 16));
        if clamped.trim().is_empty() {
            SYNTHETIC_MARKER.to_string()
        } else {
            clamped
        }
    }

    fn quotes(&self, body: &str, max_quotes: usize) -> Vec<KeyQuote> {
        let mut quotes: Vec<KeyQuote> = first_sentences(body, max_quotes.max(1))
            .into_iter()
            .map(KeyQuote::new)
            .collect();
        if quotes.is_empty() {
            quotes.push(KeyQuote::new(format!(
                "{SYNTHETIC_MARKER} Key quotes are unavailable because no generation provider could be reached."
            )));
        }
        quotes
    }

    fn social_post(&self, title: &str, topic: &str, hashtag: &str, tone: &str) -> String {
        let tone = tone.to_ascii_lowercase();
        let body = if tone.contains("casual") || tone.contains("friendly") {
            format!("Just went through \"{title}\" and it's got some good takeaways on {topic}. Worth a look!")
        } else if tone.contains("witty") || tone.contains("humor") || tone.contains("funny") {
            format!("\"{title}\": the {topic} read you didn't know you needed. Coffee optional.")
        } else if tone.contains("enthusiastic") || tone.contains("excited") {
            format!("Big ideas on {topic} in \"{title}\"! Don't miss this one!")
        } else {
            format!("New read: \"{title}\". Key insights on {topic} worth your time.")
        };
        format!("{body} {hashtag} (auto-generated)")
    }

    fn blog_post(&self, title: &str, topic: &str, summary: &str, quotes: &[KeyQuote]) -> String {
        let quote_lines = quotes
            .iter()
            .map(|q| format!("> {}", q.text))
            .collect::<Vec<_>>()
            .join("\n>\n");
        format!(
            "# {title}\n\n\
             _{SYNTHETIC_MARKER} This article was produced without an AI provider and should be regenerated._\n\n\
             ## Overview\n\n{summary}\n\n\
             ## Highlights\n\n{quote_lines}\n\n\
             ## Why it matters\n\nThe material touches on {topic}. A full article will be available once a generation provider is reachable.\n"
        )
    }
}

fn detect_topic(body: &str, source: Option<&str>) -> (&'static str, &'static str) {
    let haystack = format!("{} {}", body, source.unwrap_or("")).to_lowercase();
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TOPICS
        .iter()
        .map(|(label, tag, keywords)| {
            let hits = words
                .iter()
                .filter(|w| {
                    keywords
                        .iter()
                        .any(|k| *w == k || (k.len() >= 4 && w.starts_with(k)))
                })
                .count();
            (hits, *label, *tag)
        })
        // max_by_key returns the last maximum; reverse so earlier topics win ties.
        .rev()
        .max_by_key(|(hits, _, _)| *hits)
        .filter(|(hits, _, _)| *hits > 0)
        .map_or(GENERAL_TOPIC, |(_, label, tag)| (label, tag))
}

fn first_sentences(body: &str, limit: usize) -> Vec<String> {
    SENTENCE_RE
        .find_iter(body)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| (MIN_QUOTE_CHARS..=MAX_QUOTE_CHARS).contains(&s.chars().count()))
        .take(limit)
        .collect()
}
