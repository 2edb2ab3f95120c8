use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#+[ \t]+([^\n]+)$").unwrap());

static HEADING_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+").unwrap());

static BULLET_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").unwrap());

static NUMBERED_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").unwrap());

const HEADER_POINTS: usize = 20;
const SCORE_CAP: f64 = 100.0;
const POTENTIAL_HEADER_MAX_WORDS: usize = 8;

/// `100 × min(|a|, |b|) / max(|a|, |b|, 1)`; symmetric in its arguments.
pub fn grammar_score<S: AsRef<str>>(source_sentences: &[S], target_sentences: &[S]) -> f64 {
    let a = source_sentences.len();
    let b = target_sentences.len();
    100.0 * a.min(b) as f64 / a.max(b).max(1) as f64
}

/// Twenty points per target heading, capped at 100.
pub fn header_score(target_text: &str) -> f64 {
    header_score_for_count(markdown_headings(target_text).len())
}

pub fn header_score_for_count(heading_count: usize) -> f64 {
    ((heading_count * HEADER_POINTS) as f64).min(SCORE_CAP)
}

pub fn markdown_headings(text: &str) -> Vec<String> {
    MARKDOWN_HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}

/// Source lines that look like headings: fully uppercase, or at most eight words.
pub fn potential_headers(source_text: &str) -> Vec<String> {
    source_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            is_all_uppercase(line) || line.split_whitespace().count() <= POTENTIAL_HEADER_MAX_WORDS
        })
        .map(str::to_string)
        .collect()
}

/// How well the target carries structure (headings and list items), on a 0–1 scale.
///
/// Long documents are expected to carry one element per 500 characters;
/// short ones score 0.8 with any structure and 0.5 without.
pub fn structure_preservation(markdown: &str) -> f64 {
    let elements = HEADING_LINE_RE.find_iter(markdown).count()
        + BULLET_ITEM_RE.find_iter(markdown).count()
        + NUMBERED_ITEM_RE.find_iter(markdown).count();

    let content_length = markdown.chars().count();
    if content_length > 1000 {
        let expected = (content_length / 500).max(1);
        (elements as f64 / expected as f64).min(1.0)
    } else if elements > 0 {
        0.8
    } else {
        0.5
    }
}

fn is_all_uppercase(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}
