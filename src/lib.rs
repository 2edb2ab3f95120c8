//! Scoring engine for document conversion fidelity and quality.

pub mod accuracy;
pub mod aggregate;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fidelity;
pub mod normalize;
pub mod quality;
pub mod report;
pub mod source;
pub mod structural;

pub use accuracy::{
    cosine_similarity, validate_accuracy, AccuracyMetrics, ChunkDetail, EmbeddingSimilarity,
    SemanticCapability, SemanticScorer, SentenceEncoder,
};
pub use aggregate::{
    AccuracyGrade, Metric, MetricScore, QualityGrade, RecommendationRules, WeightTable,
};
pub use config::{EngineConfig, ReportSettings, SourceSettings, Thresholds};
pub use diff::{text_similarity, unified_diff};
pub use engine::{ComparisonInput, ComparisonMetrics, ComparisonReport, Evaluator, HeadingSummary};
pub use error::EvalError;
pub use fidelity::{
    missing_words, word_fidelity, FidelityAssessment, FidelityBreakdown, WordCount,
    WordFidelityReport, WordMultiset,
};
pub use normalize::{extract_sentences, extract_words, normalize_for_comparison, strip_markup};
pub use quality::{analyze_quality, QualityMetrics};
pub use report::{render_accuracy, render_comparison, render_fidelity, render_quality};
pub use source::{
    select_source, ExtractedText, SourceSelection, SourceTextProvider, TextFileProvider,
};
pub use structural::{
    grammar_score, header_score, markdown_headings, potential_headers, structure_preservation,
};
