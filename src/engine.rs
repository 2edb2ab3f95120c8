use serde::Serialize;
use tracing::{debug, info, warn};

use crate::accuracy::{validate_accuracy, AccuracyMetrics, SemanticCapability};
use crate::aggregate::{
    AccuracyGrade, ClosingRemark, Metric, MetricScore, RecommendationRules, ThresholdCheck,
    COMPARISON_WEIGHTS,
};
use crate::config::{EngineConfig, Thresholds};
use crate::diff::unified_diff;
use crate::error::EvalError;
use crate::fidelity::{FidelityBreakdown, WordFidelityReport};
use crate::normalize::{extract_sentences, extract_words};
use crate::quality::{analyze_quality, QualityMetrics};
use crate::source::{select_source, ExtractedText, SourceSelection, SourceTextProvider};
use crate::structural::{
    grammar_score, header_score_for_count, markdown_headings, potential_headers,
};

const DIFF_CONTEXT_LINES: usize = 3;

pub const EMPTY_SOURCE_NOTE: &str =
    "No source words found - source text extraction may have failed; word fidelity reported as 0";

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonInput {
    pub source_text: String,
    pub target_text: String,
}

impl ComparisonInput {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

/// Comparison scores in percent; `overall_score` is always the 0.6/0.3/0.1
/// combination of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonMetrics {
    word_fidelity: f64,
    grammar_score: f64,
    header_score: f64,
    overall_score: f64,
}

impl ComparisonMetrics {
    pub fn new(word_fidelity: f64, grammar_score: f64, header_score: f64) -> Self {
        let mut metrics = Self {
            word_fidelity,
            grammar_score,
            header_score,
            overall_score: 0.0,
        };
        metrics.overall_score = COMPARISON_WEIGHTS.combine(&metrics.scores());
        metrics
    }

    pub fn word_fidelity(&self) -> f64 {
        self.word_fidelity
    }

    pub fn grammar_score(&self) -> f64 {
        self.grammar_score
    }

    pub fn header_score(&self) -> f64 {
        self.header_score
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn scores(&self) -> Vec<MetricScore> {
        vec![
            MetricScore::new(Metric::WordFidelity, self.word_fidelity),
            MetricScore::new(Metric::GrammarScore, self.grammar_score),
            MetricScore::new(Metric::HeaderScore, self.header_score),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingSummary {
    pub markdown_count: usize,
    pub markdown_sample: Vec<String>,
    pub potential_source_count: usize,
    pub potential_source_sample: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub metrics: ComparisonMetrics,
    pub grade: AccuracyGrade,
    pub fidelity: WordFidelityReport,
    pub source_sentences: usize,
    pub target_sentences: usize,
    pub headings: HeadingSummary,
    pub diff_preview: Vec<String>,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

pub fn comparison_rules(thresholds: &Thresholds) -> RecommendationRules {
    RecommendationRules {
        checks: vec![
            ThresholdCheck {
                metric: Metric::WordFidelity,
                below: thresholds.word_fidelity,
                message: "Word fidelity is below target - check content completeness for missing or garbled text",
            },
            ThresholdCheck {
                metric: Metric::GrammarScore,
                below: thresholds.grammar,
                message: "Sentence structure differs from the source - check for merged or split sentences",
            },
            ThresholdCheck {
                metric: Metric::HeaderScore,
                below: thresholds.header,
                message: "Few headings detected - check that section titles were converted to markdown headers",
            },
        ],
        closings: vec![
            ClosingRemark {
                above: 90.0,
                message: "Excellent conversion fidelity!",
            },
            ClosingRemark {
                above: 80.0,
                message: "Good conversion fidelity with minor gaps",
            },
        ],
        fallback: "Conversion fidelity needs improvement - review extraction and conversion steps",
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Scoring engine. Configuration and the semantic capability are fixed at
/// construction; every run is independent.
#[derive(Debug, Default)]
pub struct Evaluator {
    config: EngineConfig,
    semantic: SemanticCapability,
}

impl Evaluator {
    pub fn new(config: EngineConfig, semantic: SemanticCapability) -> Self {
        Self { config, semantic }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn semantic(&self) -> &SemanticCapability {
        &self.semantic
    }

    pub fn compare(&self, input: &ComparisonInput) -> ComparisonReport {
        let settings = &self.config.report;
        let source_words = extract_words(&input.source_text);
        let target_words = extract_words(&input.target_text);
        let source_sentences = extract_sentences(&input.source_text);
        let target_sentences = extract_sentences(&input.target_text);
        let headings = markdown_headings(&input.target_text);
        let potential = potential_headers(&input.source_text);
        info!(
            source_chars = input.source_text.chars().count(),
            target_chars = input.target_text.chars().count(),
            source_words = source_words.len(),
            target_words = target_words.len(),
            "comparing texts"
        );

        let breakdown = FidelityBreakdown::compute(&source_words, &target_words);
        let metrics = ComparisonMetrics::new(
            breakdown.score,
            grammar_score(&source_sentences, &target_sentences),
            header_score_for_count(headings.len()),
        );
        debug!(
            word_fidelity = metrics.word_fidelity(),
            grammar_score = metrics.grammar_score(),
            header_score = metrics.header_score(),
            source_sentences = source_sentences.len(),
            target_sentences = target_sentences.len(),
            headings = headings.len(),
            "comparison metrics"
        );

        let recommendations = self.comparison_recommendations(&metrics, source_words.is_empty());
        let fidelity = WordFidelityReport::new(
            breakdown.limit_samples(settings.word_sample),
            self.config.thresholds.foundation,
        );

        let report = ComparisonReport {
            grade: AccuracyGrade::from_percent(metrics.overall_score()),
            metrics,
            fidelity,
            source_sentences: source_sentences.len(),
            target_sentences: target_sentences.len(),
            headings: HeadingSummary {
                markdown_count: headings.len(),
                markdown_sample: headings.into_iter().take(settings.header_sample).collect(),
                potential_source_count: potential.len(),
                potential_source_sample: potential
                    .into_iter()
                    .take(settings.header_sample)
                    .collect(),
            },
            diff_preview: unified_diff(
                &input.source_text,
                &input.target_text,
                DIFF_CONTEXT_LINES,
                settings.diff_preview_lines,
            ),
            recommendations,
        };
        info!(
            overall_score = report.metrics.overall_score(),
            grade = report.grade.label(),
            "comparison finished"
        );
        report
    }

    fn comparison_recommendations(
        &self,
        metrics: &ComparisonMetrics,
        source_empty: bool,
    ) -> Vec<String> {
        let mut scores = metrics.scores();
        let mut out = Vec::new();
        if source_empty {
            warn!("source text has no comparable words; word fidelity is 0");
            scores.retain(|s| s.metric != Metric::WordFidelity);
            out.push(EMPTY_SOURCE_NOTE.to_string());
        }
        let rules = comparison_rules(&self.config.thresholds);
        out.extend(rules.recommend(&scores, metrics.overall_score()));
        out
    }

    pub fn word_fidelity(&self, input: &ComparisonInput) -> WordFidelityReport {
        let source_words = extract_words(&input.source_text);
        let target_words = extract_words(&input.target_text);
        if source_words.is_empty() {
            warn!("source text has no comparable words; word fidelity is 0");
        }
        let breakdown = FidelityBreakdown::compute(&source_words, &target_words)
            .limit_samples(self.config.report.word_sample);
        let report = WordFidelityReport::new(breakdown, self.config.thresholds.foundation);
        info!(
            score = report.breakdown.score,
            source_words = report.breakdown.source_words,
            target_words = report.breakdown.target_words,
            foundation_solid = report.foundation_solid,
            "word fidelity finished"
        );
        report
    }

    pub fn analyze_quality(&self, target: &str, pages_hint: Option<usize>) -> QualityMetrics {
        info!(chars = target.chars().count(), "analyzing document quality");
        let metrics = analyze_quality(target, pages_hint);
        debug!(
            structure = metrics.structure(),
            content_richness = metrics.content_richness(),
            formatting = metrics.formatting(),
            readability = metrics.readability(),
            "quality dimensions"
        );
        info!(
            overall_quality = metrics.overall_quality(),
            word_count = metrics.word_count(),
            estimated_pages = metrics.estimated_pages(),
            "quality analysis finished"
        );
        metrics
    }

    pub fn validate_accuracy(&self, source: &ExtractedText, target: &str) -> AccuracyMetrics {
        info!(
            source_chars = source.full_text.chars().count(),
            target_chars = target.chars().count(),
            pages = source.page_count(),
            semantic = self.semantic.name().unwrap_or("absent"),
            "validating conversion accuracy"
        );
        let metrics = validate_accuracy(source, target, &self.semantic);
        info!(
            overall_accuracy = metrics.overall_accuracy(),
            grade = metrics.grade().label(),
            "accuracy validation finished"
        );
        metrics
    }

    pub fn select_source(
        &self,
        providers: &[Box<dyn SourceTextProvider>],
    ) -> Result<SourceSelection, EvalError> {
        select_source(providers, self.config.source.min_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> Evaluator {
        Evaluator::default()
    }

    #[test]
    fn overall_is_weighted_combination() {
        let m = ComparisonMetrics::new(80.0, 50.0, 20.0);
        assert!((m.overall_score() - (48.0 + 15.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn identical_texts_compare_cleanly() {
        let text = "# Overview\n\nRevenue grew strongly. Costs were flat.";
        let report = evaluator().compare(&ComparisonInput::new(text, text));
        assert_eq!(report.metrics.word_fidelity(), 100.0);
        assert_eq!(report.metrics.grammar_score(), 100.0);
        assert_eq!(report.metrics.header_score(), 20.0);
        assert!(report.diff_preview.is_empty());
        assert!(report.fidelity.breakdown.missing.is_empty());
    }

    #[test]
    fn empty_source_gets_explanatory_note_first() {
        let report = evaluator().compare(&ComparisonInput::new("", "# Title\nSome text."));
        assert_eq!(report.metrics.word_fidelity(), 0.0);
        assert_eq!(report.recommendations[0], EMPTY_SOURCE_NOTE);
        assert!(!report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Word fidelity is below")));
    }

    #[test]
    fn samples_follow_report_settings() {
        let mut config = EngineConfig::default();
        config.report.word_sample = 2;
        config.report.header_sample = 1;
        let evaluator = Evaluator::new(config, SemanticCapability::Absent);
        let input = ComparisonInput::new(
            "alpha bravo charlie delta echo",
            "# One\n# Two\nzulu",
        );
        let report = evaluator.compare(&input);
        assert_eq!(report.fidelity.breakdown.missing.len(), 2);
        assert_eq!(report.fidelity.breakdown.missing[0].word, "alpha");
        assert_eq!(report.headings.markdown_count, 2);
        assert_eq!(report.headings.markdown_sample, vec!["One"]);
    }

    #[test]
    fn thresholds_drive_comparison_checks() {
        let mut config = EngineConfig::default();
        config.thresholds.header = 10.0;
        let evaluator = Evaluator::new(config, SemanticCapability::Absent);
        let text = "# Heading\nPlain words follow here.";
        let report = evaluator.compare(&ComparisonInput::new(text, text));
        assert!(!report.recommendations.iter().any(|r| r.starts_with("Few headings")));
    }

    #[test]
    fn word_fidelity_report_uses_foundation_threshold() {
        let input = ComparisonInput::new("alpha bravo charlie delta", "alpha bravo charlie");
        let report = evaluator().word_fidelity(&input);
        assert_eq!(report.breakdown.score, 75.0);
        assert!(report.foundation_solid);
    }
}
