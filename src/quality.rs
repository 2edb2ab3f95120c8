use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::aggregate::{
    ClosingRemark, Metric, MetricScore, QualityGrade, RecommendationRules, ThresholdCheck,
    QUALITY_WEIGHTS,
};
use crate::normalize::collapse_whitespace;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

struct QualityParameters {
    short_document_chars: usize,
    short_document_structure: f64,
    chars_per_structural_element: usize,
    structure_ratio_cap: f64,
    structure_ratio_scale: f64,
    hierarchy_bonus: f64,
    emphasis_per_bonus_point: f64,
    emphasis_bonus_cap: f64,
    richness_buckets: [(usize, f64); 3],
    richness_top: f64,
    richness_floor: f64,
    richness_bonus: f64,
    balanced_sentence_words: (f64, f64),
    neutral_formatting: f64,
    formatting_variety_bonus: f64,
    readable_sentence_words: (f64, f64),
    long_sentence_words: f64,
    readable_score: f64,
    long_score: f64,
    very_long_score: f64,
    very_short_score: f64,
    no_sentence_score: f64,
    flow_bonus: f64,
    words_per_page: usize,
}

static QP: QualityParameters = QualityParameters {
    short_document_chars: 1000,
    short_document_structure: 0.5,
    chars_per_structural_element: 200,
    structure_ratio_cap: 2.0,
    structure_ratio_scale: 0.5,
    hierarchy_bonus: 0.1,
    emphasis_per_bonus_point: 50.0,
    emphasis_bonus_cap: 0.2,
    richness_buckets: [(100, 0.2), (500, 0.4), (2000, 0.6)],
    richness_top: 0.8,
    richness_floor: 0.2,
    richness_bonus: 0.05,
    balanced_sentence_words: (10.0, 25.0),
    neutral_formatting: 0.5,
    formatting_variety_bonus: 0.1,
    readable_sentence_words: (5.0, 20.0),
    long_sentence_words: 30.0,
    readable_score: 1.0,
    long_score: 0.8,
    very_long_score: 0.6,
    very_short_score: 0.7,
    no_sentence_score: 0.3,
    flow_bonus: 0.1,
    words_per_page: 275,
};

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+").unwrap());
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+").unwrap());
static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##\s+").unwrap());
static H3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^###\s+").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").unwrap());
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").unwrap());
static HORIZONTAL_RULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^---+$").unwrap());
static BOLD_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*]+\*\*").unwrap());
static ITALIC_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]+\*").unwrap());

static WORD_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());
static TERMINAL_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());
static TOC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(table of contents|contents)").unwrap());
static REFERENCES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(references|bibliography|notes)").unwrap());
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

static PROPER_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+[^\n]+$").unwrap());
static CRAMPED_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+[^#\s]").unwrap());
static DASH_BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*-\s+").unwrap());
static CLOSED_BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*\n]+\*\*").unwrap());
static EXCESSIVE_BREAKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

static READABILITY_MARKUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*\-\[\]()_`]").unwrap());
static TRANSITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(however|therefore|furthermore|moreover|additionally)\b").unwrap()
});
static SECONDARY_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;:]").unwrap());

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureCounts {
    pub headers: usize,
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub bullet_items: usize,
    pub numbered_items: usize,
    pub horizontal_rules: usize,
    pub bold_spans: usize,
    pub italic_spans: usize,
}

impl StructureCounts {
    pub fn scan(markdown: &str) -> Self {
        Self {
            headers: HEADER_RE.find_iter(markdown).count(),
            h1: H1_RE.find_iter(markdown).count(),
            h2: H2_RE.find_iter(markdown).count(),
            h3: H3_RE.find_iter(markdown).count(),
            bullet_items: BULLET_RE.find_iter(markdown).count(),
            numbered_items: NUMBERED_RE.find_iter(markdown).count(),
            horizontal_rules: HORIZONTAL_RULE_RE.find_iter(markdown).count(),
            bold_spans: BOLD_SPAN_RE.find_iter(markdown).count(),
            italic_spans: ITALIC_SPAN_RE.find_iter(markdown).count(),
        }
    }

    pub fn structural_elements(&self) -> usize {
        self.headers + self.bullet_items + self.numbered_items + self.horizontal_rules
    }

    pub fn emphasis_elements(&self) -> usize {
        self.bold_spans + self.italic_spans
    }
}

/// Quality dimensions of one document. `overall_quality` is always the
/// weighted sum of the four dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    structure: f64,
    content_richness: f64,
    formatting: f64,
    readability: f64,
    overall_quality: f64,
    word_count: usize,
    estimated_pages: usize,
    recommendations: Vec<String>,
}

impl QualityMetrics {
    pub fn structure(&self) -> f64 {
        self.structure
    }

    pub fn content_richness(&self) -> f64 {
        self.content_richness
    }

    pub fn formatting(&self) -> f64 {
        self.formatting
    }

    pub fn readability(&self) -> f64 {
        self.readability
    }

    pub fn overall_quality(&self) -> f64 {
        self.overall_quality
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn estimated_pages(&self) -> usize {
        self.estimated_pages
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_fraction(self.overall_quality)
    }

    pub fn scores(&self) -> Vec<MetricScore> {
        vec![
            MetricScore::new(Metric::Structure, self.structure),
            MetricScore::new(Metric::ContentRichness, self.content_richness),
            MetricScore::new(Metric::Formatting, self.formatting),
            MetricScore::new(Metric::Readability, self.readability),
        ]
    }
}

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

pub fn analyze_structure(markdown: &str) -> f64 {
    let content_length = markdown.chars().count();
    if content_length < QP.short_document_chars {
        return QP.short_document_structure;
    }

    let counts = StructureCounts::scan(markdown);
    let expected = (content_length / QP.chars_per_structural_element).max(1);
    let ratio = (counts.structural_elements() as f64 / expected as f64)
        .min(QP.structure_ratio_cap)
        * QP.structure_ratio_scale;
    let hierarchy = if counts.h1 > 0 && counts.h2 > 0 {
        QP.hierarchy_bonus
    } else {
        0.0
    };
    let emphasis = (counts.emphasis_elements() as f64 / QP.emphasis_per_bonus_point)
        .min(QP.emphasis_bonus_cap);

    (ratio + hierarchy + emphasis).min(1.0)
}

pub fn analyze_content_richness(markdown: &str) -> f64 {
    let words = count_words(markdown);
    let sentences = TERMINAL_RUN_RE.find_iter(markdown).count();

    if words < QP.richness_buckets[0].0 {
        return QP.richness_floor;
    }
    let base = QP
        .richness_buckets
        .iter()
        .find(|(limit, _)| words < *limit)
        .map_or(QP.richness_top, |(_, score)| *score);

    let has_mixed_case = markdown.chars().any(|c| c.is_ascii_uppercase())
        && markdown.chars().any(|c| c.is_ascii_lowercase());
    let flags = [
        TOC_RE.is_match(markdown),
        REFERENCES_RE.is_match(markdown),
        DIGIT_RE.is_match(markdown),
        has_mixed_case,
        sentences > 0 && {
            let avg = words as f64 / sentences as f64;
            let (low, high) = QP.balanced_sentence_words;
            (low..=high).contains(&avg)
        },
    ];
    let bonus = flags.iter().filter(|f| **f).count() as f64 * QP.richness_bonus;

    (base + bonus).min(1.0)
}

/// Share of well-formed markup among all markup elements and detected issues.
///
/// Malformed markup lowers this score; it is never rejected.
pub fn analyze_formatting(markdown: &str) -> f64 {
    let proper_headers = PROPER_HEADER_RE.find_iter(markdown).count();
    let cramped_headers = CRAMPED_HEADER_RE.find_iter(markdown).count();
    let dash_bullets = DASH_BULLET_RE.find_iter(markdown).count();
    let bold = CLOSED_BOLD_RE.find_iter(markdown).count();
    let italic = count_single_emphasis(markdown);
    let excessive_breaks = EXCESSIVE_BREAKS_RE.find_iter(markdown).count();

    let well_formed = proper_headers + dash_bullets + bold + italic;
    let issues = cramped_headers + excessive_breaks;
    if well_formed == 0 {
        return QP.neutral_formatting;
    }

    let ratio = well_formed as f64 / (well_formed + issues).max(1) as f64;
    let variety = if bold > 0 && italic > 0 && proper_headers > 0 {
        QP.formatting_variety_bonus
    } else {
        0.0
    };
    (ratio + variety).min(1.0)
}

pub fn analyze_readability(markdown: &str) -> f64 {
    let clean = collapse_whitespace(&READABILITY_MARKUP_RE.replace_all(markdown, ""));
    if clean.is_empty() {
        return 0.0;
    }

    let words = count_words(&clean);
    let sentences = TERMINAL_RUN_RE.find_iter(&clean).count();
    if sentences == 0 {
        return QP.no_sentence_score;
    }

    let avg = words as f64 / sentences as f64;
    let (low, high) = QP.readable_sentence_words;
    let sentence_score = if (low..=high).contains(&avg) {
        QP.readable_score
    } else if avg > high && avg <= QP.long_sentence_words {
        QP.long_score
    } else if avg > QP.long_sentence_words {
        QP.very_long_score
    } else {
        QP.very_short_score
    };

    let flows = TRANSITION_RE.is_match(&clean) || SECONDARY_PUNCT_RE.is_match(&clean);
    let bonus = if flows { QP.flow_bonus } else { 0.0 };
    (sentence_score + bonus).min(1.0)
}

pub fn count_words(text: &str) -> usize {
    WORD_RUN_RE.find_iter(text).count()
}

pub fn estimate_pages(word_count: usize) -> usize {
    (word_count / QP.words_per_page).max(1)
}

pub fn quality_rules() -> RecommendationRules {
    RecommendationRules {
        checks: vec![
            ThresholdCheck {
                metric: Metric::Structure,
                below: 0.6,
                message: "Improve document structure by ensuring proper headers and consistent formatting",
            },
            ThresholdCheck {
                metric: Metric::ContentRichness,
                below: 0.6,
                message: "Content richness is low - verify all sections and details were captured",
            },
            ThresholdCheck {
                metric: Metric::Formatting,
                below: 0.7,
                message: "Markdown formatting needs improvement - check for proper syntax usage",
            },
            ThresholdCheck {
                metric: Metric::Readability,
                below: 0.7,
                message: "Readability could be improved - check sentence structure and flow",
            },
        ],
        closings: vec![
            ClosingRemark {
                above: 0.85,
                message: "Excellent conversion quality! Document is well-structured and readable.",
            },
            ClosingRemark {
                above: 0.7,
                message: "Good conversion quality with some room for improvement.",
            },
        ],
        fallback: "Conversion quality needs attention - consider reviewing extraction and formatting processes.",
    }
}

pub fn analyze_quality(markdown: &str, pages_hint: Option<usize>) -> QualityMetrics {
    let structure = analyze_structure(markdown);
    let content_richness = analyze_content_richness(markdown);
    let formatting = analyze_formatting(markdown);
    let readability = analyze_readability(markdown);
    let word_count = count_words(markdown);

    let mut metrics = QualityMetrics {
        structure,
        content_richness,
        formatting,
        readability,
        overall_quality: 0.0,
        word_count,
        estimated_pages: pages_hint.unwrap_or_else(|| estimate_pages(word_count)),
        recommendations: Vec::new(),
    };
    let scores = metrics.scores();
    metrics.overall_quality = QUALITY_WEIGHTS.combine(&scores);
    metrics.recommendations = quality_rules().recommend(&scores, metrics.overall_quality);
    metrics
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Count `*text*` spans that are not part of a `**` run and do not cross a line.
fn count_single_emphasis(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        let opens = bytes[i] == b'*'
            && (i == 0 || bytes[i - 1] != b'*')
            && bytes.get(i + 1).is_some_and(|&b| b != b'*' && b != b'\n');
        if opens {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b'*' && bytes[j] != b'\n' {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'*' && bytes.get(j + 1) != Some(&b'*') {
                count += 1;
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    count
}
