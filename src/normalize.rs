use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"={3,}[^\n]*?={3,}").unwrap());

static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[([^\[\]]*)\]\([^()]*\)").unwrap());

static HORIZONTAL_RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$").unwrap());

static HEADING_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#+[ \t]*").unwrap());

static BULLET_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap());

static BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*|__([^_\n]+)__").unwrap());

static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());

static INLINE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]*)`").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z]{3,}\b").unwrap());

static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Punctuation that survives normalization. Everything else that is not
/// alphanumeric or whitespace is markup or extraction noise.
const KEPT_PUNCTUATION: &str = ".,;:!?'\"()%$&/@";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Remove markup syntax while keeping the visible text and its casing.
pub fn strip_markup(text: &str) -> String {
    let text = replace_links(text);
    let text = HORIZONTAL_RULE_RE.replace_all(&text, "");
    let text = HEADING_MARKER_RE.replace_all(&text, "");
    let text = BULLET_MARKER_RE.replace_all(&text, "");
    let text = BOLD_RE.replace_all(&text, "${1}${2}");
    let text = ITALIC_RE.replace_all(&text, "${1}");
    INLINE_CODE_RE.replace_all(&text, "${1}").into_owned()
}

/// Lowercased, markup-free, single-spaced text used for every comparison.
///
/// Idempotent: the output contains none of the characters the markup
/// patterns key on, so a second pass leaves it unchanged.
pub fn normalize_for_comparison(text: &str) -> String {
    let text = PAGE_MARKER_RE.replace_all(text, " ");
    let lowered = strip_markup(&text).to_lowercase();
    let filtered: String = lowered
        .chars()
        .map(|c| if is_kept_char(c) { c } else { ' ' })
        .collect();
    collapse_whitespace(&filtered)
}

pub fn extract_words(text: &str) -> Vec<String> {
    let normalized = normalize_for_comparison(text);
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Split on runs of `.`, `!` and `?`, dropping empty fragments.
pub fn extract_sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn replace_links(text: &str) -> String {
    let mut current = text.to_string();
    // Nested brackets can expose a new link once the inner one collapses.
    while LINK_RE.is_match(&current) {
        current = LINK_RE.replace_all(&current, "${1}").into_owned();
    }
    current
}

fn is_kept_char(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(c)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_headings_emphasis_and_bullets() {
        let text = "# Title\n\nSome **bold** and *italic* text.\n- first item\n* second item";
        assert_eq!(
            normalize_for_comparison(text),
            "title some bold and italic text. first item second item"
        );
    }

    #[test]
    fn links_keep_label_and_drop_target() {
        let text = "See [the manual](https://example.com/manual) for details.";
        assert_eq!(
            normalize_for_comparison(text),
            "see the manual for details."
        );
        let nested = "[[inner](a)](b)";
        assert_eq!(normalize_for_comparison(nested), "inner");
    }

    #[test]
    fn page_markers_become_whitespace() {
        let text = "end of one=== PAGE 2 ===start of two";
        assert_eq!(normalize_for_comparison(text), "end of one start of two");
        assert!(!extract_words(text).contains(&"page".to_string()));
    }

    #[test]
    fn horizontal_rules_are_removed() {
        let text = "Above\n\n---\n\nBelow\n***\n";
        assert_eq!(normalize_for_comparison(text), "above below");
    }

    #[test]
    fn strip_markup_preserves_case() {
        let text = "## Quarterly Review\n**Revenue** grew.";
        assert_eq!(strip_markup(text), "Quarterly Review\nRevenue grew.");
    }

    #[test]
    fn normalization_is_idempotent_on_mixed_markup() {
        let text = "# A *b* [c](d)\n=== PAGE 1 ===\n+ item __x__ `code` | cell | -- C++";
        let once = normalize_for_comparison(text);
        assert_eq!(normalize_for_comparison(&once), once);
    }

    #[test]
    fn words_filter_short_and_numeric_tokens() {
        let words = extract_words("An ox ran 42 km to the big barn, page 7.");
        assert_eq!(words, vec!["ran", "the", "big", "barn", "page"]);
    }

    #[test]
    fn words_are_lowercase() {
        assert_eq!(extract_words("QUICK Brown"), vec!["quick", "brown"]);
    }

    #[test]
    fn hyphenated_words_split() {
        assert_eq!(extract_words("well-known cross-check"), vec![
            "well", "known", "cross", "check"
        ]);
    }

    #[test]
    fn sentences_split_on_terminal_runs() {
        let sentences = extract_sentences("One. Two!! Three?! ... Four");
        assert_eq!(sentences, vec!["One", "Two", "Three", "Four"]);
    }

    #[test]
    fn sentence_split_is_naive_about_decimals() {
        assert_eq!(extract_sentences("Pi is 3.14 roughly.").len(), 2);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(normalize_for_comparison(""), "");
        assert!(extract_words("").is_empty());
        assert!(extract_sentences("   ").is_empty());
    }
}
