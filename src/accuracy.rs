use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::{
    AccuracyGrade, ClosingRemark, Metric, MetricScore, RecommendationRules, ThresholdCheck,
    ACCURACY_WEIGHTS_REDUCED, ACCURACY_WEIGHTS_SEMANTIC,
};
use crate::diff::text_similarity;
use crate::error::EvalError;
use crate::normalize::{extract_sentences, strip_markup};
use crate::source::ExtractedText;
use crate::structural::structure_preservation;

/// Sentences per side sent to a sentence encoder.
pub const MAX_ENCODED_SENTENCES: usize = 20;

// ---------------------------------------------------------------------------
// Semantic capability
// ---------------------------------------------------------------------------

/// Meaning-level similarity of two texts, in `[0, 1]`.
pub trait SemanticScorer: Send + Sync {
    fn name(&self) -> &str;
    fn similarity(&self, source: &str, target: &str) -> Result<f64, EvalError>;
}

#[derive(Default)]
pub enum SemanticCapability {
    #[default]
    Absent,
    Present(Box<dyn SemanticScorer>),
}

impl SemanticCapability {
    pub fn present(scorer: impl SemanticScorer + 'static) -> Self {
        Self::Present(Box::new(scorer))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Present(scorer) => Some(scorer.name()),
        }
    }
}

impl fmt::Debug for SemanticCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Present(scorer) => f.debug_tuple("Present").field(&scorer.name()).finish(),
        }
    }
}

/// Turns sentences into fixed-length embedding vectors, one per sentence.
pub trait SentenceEncoder: Send + Sync {
    fn name(&self) -> &str;
    fn encode(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EvalError>;
}

/// Semantic scorer over any sentence encoder: the mean, over source
/// sentences, of the best cosine match among target sentences.
#[derive(Debug, Clone)]
pub struct EmbeddingSimilarity<E> {
    encoder: E,
}

impl<E: SentenceEncoder> EmbeddingSimilarity<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    fn embed(&self, text: &str) -> Result<Vec<Vec<f32>>, EvalError> {
        let mut sentences = extract_sentences(text);
        sentences.truncate(MAX_ENCODED_SENTENCES);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.encoder.encode(&sentences)?;
        if embeddings.len() != sentences.len() {
            return Err(EvalError::unavailable(
                self.encoder.name(),
                format!(
                    "returned {} embeddings for {} sentences",
                    embeddings.len(),
                    sentences.len()
                ),
            ));
        }
        Ok(embeddings)
    }
}

impl<E: SentenceEncoder> SemanticScorer for EmbeddingSimilarity<E> {
    fn name(&self) -> &str {
        self.encoder.name()
    }

    fn similarity(&self, source: &str, target: &str) -> Result<f64, EvalError> {
        let source_embeddings = self.embed(source)?;
        let target_embeddings = self.embed(target)?;
        if source_embeddings.is_empty() || target_embeddings.is_empty() {
            return Ok(0.0);
        }

        let total: f64 = source_embeddings
            .iter()
            .map(|s| {
                target_embeddings
                    .iter()
                    .map(|t| cosine_similarity(s, t) as f64)
                    .fold(0.0, f64::max)
            })
            .sum();
        Ok((total / source_embeddings.len() as f64).clamp(0.0, 1.0))
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkDetail {
    pub chunk_number: usize,
    pub pages: String,
    pub accuracy: f64,
    pub notes: String,
}

/// Accuracy of a conversion on a 0–1 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    overall_accuracy: f64,
    text_completeness: f64,
    structure_preservation: f64,
    semantic_similarity: f64,
    semantic_scorer: Option<String>,
    semantic_error: Option<String>,
    page_count: usize,
    chunk_details: Vec<ChunkDetail>,
    recommendations: Vec<String>,
}

impl AccuracyMetrics {
    pub fn overall_accuracy(&self) -> f64 {
        self.overall_accuracy
    }

    pub fn text_completeness(&self) -> f64 {
        self.text_completeness
    }

    pub fn structure_preservation(&self) -> f64 {
        self.structure_preservation
    }

    pub fn semantic_similarity(&self) -> f64 {
        self.semantic_similarity
    }

    pub fn semantic_scorer(&self) -> Option<&str> {
        self.semantic_scorer.as_deref()
    }

    /// Why the configured scorer produced no similarity, if it failed.
    pub fn semantic_error(&self) -> Option<&str> {
        self.semantic_error.as_deref()
    }

    pub fn semantic_available(&self) -> bool {
        self.semantic_scorer.is_some()
    }

    pub fn semantic_weighted(&self) -> bool {
        self.semantic_available() && self.semantic_similarity > 0.0
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn chunk_details(&self) -> &[ChunkDetail] {
        &self.chunk_details
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn grade(&self) -> AccuracyGrade {
        AccuracyGrade::from_fraction(self.overall_accuracy)
    }
}

pub fn accuracy_rules() -> RecommendationRules {
    RecommendationRules {
        checks: vec![
            ThresholdCheck {
                metric: Metric::TextCompleteness,
                below: 0.8,
                message: "Text completeness is low - check for missing content or text extraction issues",
            },
            ThresholdCheck {
                metric: Metric::StructurePreservation,
                below: 0.7,
                message: "Structure preservation could be improved - consider better header and list detection",
            },
            ThresholdCheck {
                metric: Metric::SemanticSimilarity,
                below: 0.7,
                message: "Semantic similarity is low - content meaning may not be fully preserved",
            },
        ],
        closings: vec![
            ClosingRemark {
                above: 0.9,
                message: "Excellent conversion quality!",
            },
            ClosingRemark {
                above: 0.8,
                message: "Good conversion quality with minor improvements possible",
            },
        ],
        fallback: "Conversion quality needs improvement - review extraction and formatting logic",
    }
}

pub fn validate_accuracy(
    source: &ExtractedText,
    target: &str,
    semantic: &SemanticCapability,
) -> AccuracyMetrics {
    let target_text = strip_markup(target);
    let text_completeness = text_similarity(&source.full_text, &target_text);
    let structure = structure_preservation(target);

    let mut semantic_error = None;
    let semantic_similarity = match semantic {
        SemanticCapability::Absent => 0.0,
        SemanticCapability::Present(scorer) => {
            match scorer.similarity(&source.full_text, &target_text) {
                Ok(value) => value.clamp(0.0, 1.0),
                Err(err) => {
                    warn!(
                        scorer = scorer.name(),
                        error = %err,
                        "semantic similarity failed; scoring without it"
                    );
                    semantic_error = Some(format!("{}: {err}", scorer.name()));
                    0.0
                }
            }
        }
    };
    debug!(
        text_completeness,
        structure_preservation = structure,
        semantic_similarity,
        "accuracy dimensions"
    );

    let mut scores = vec![
        MetricScore::new(Metric::TextCompleteness, text_completeness),
        MetricScore::new(Metric::StructurePreservation, structure),
    ];
    if semantic.is_present() && semantic_error.is_none() {
        scores.push(MetricScore::new(Metric::SemanticSimilarity, semantic_similarity));
    }
    let table = if semantic.is_present() && semantic_similarity > 0.0 {
        ACCURACY_WEIGHTS_SEMANTIC
    } else {
        ACCURACY_WEIGHTS_REDUCED
    };
    let overall_accuracy = table.combine(&scores);

    let page_count = source.page_count();
    let chunk_details = vec![ChunkDetail {
        chunk_number: 1,
        pages: format!("1-{page_count}"),
        accuracy: overall_accuracy,
        notes: format!("Full document analysis with {page_count} pages"),
    }];

    let mut recommendations = accuracy_rules().recommend(&scores, overall_accuracy);
    if let Some(reason) = &semantic_error {
        // the closing remark stays last
        let at = recommendations.len().saturating_sub(1);
        recommendations.insert(
            at,
            format!(
                "Semantic similarity could not be computed ({reason}); \
                 reported as 0 and excluded from the overall score"
            ),
        );
    }

    AccuracyMetrics {
        overall_accuracy,
        text_completeness,
        structure_preservation: structure,
        semantic_similarity,
        semantic_scorer: semantic.name().map(str::to_string),
        semantic_error,
        page_count,
        chunk_details,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScorer(f64);

    impl SemanticScorer for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn similarity(&self, _: &str, _: &str) -> Result<f64, EvalError> {
            Ok(self.0)
        }
    }

    struct FailingScorer;

    impl SemanticScorer for FailingScorer {
        fn name(&self) -> &str {
            "failing"
        }

        fn similarity(&self, _: &str, _: &str) -> Result<f64, EvalError> {
            Err(EvalError::unavailable("failing", "model not loaded"))
        }
    }

    /// One-hot embedding keyed on the first letter of each sentence.
    struct InitialEncoder;

    impl SentenceEncoder for InitialEncoder {
        fn name(&self) -> &str {
            "initial"
        }

        fn encode(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EvalError> {
            Ok(sentences
                .iter()
                .map(|s| {
                    let mut v = vec![0.0; 26];
                    if let Some(c) = s.chars().next().filter(char::is_ascii_alphabetic) {
                        v[(c.to_ascii_lowercase() as u8 - b'a') as usize] = 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    struct ShortEncoder;

    impl SentenceEncoder for ShortEncoder {
        fn name(&self) -> &str {
            "short"
        }

        fn encode(&self, _: &[String]) -> Result<Vec<Vec<f32>>, EvalError> {
            Ok(vec![vec![1.0]])
        }
    }

    fn source() -> ExtractedText {
        ExtractedText::from_pages(vec![
            "Quarterly revenue grew in every region.".to_string(),
            "Costs fell for the third year.".to_string(),
        ])
    }

    const TARGET: &str = "# Results\n\nQuarterly revenue grew in every region.\n\n- Costs fell for the third year.\n";

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn embedding_similarity_averages_best_matches() {
        let scorer = EmbeddingSimilarity::new(InitialEncoder);
        let score = scorer
            .similarity("Alpha one. Beta two.", "Alpha again. Gamma three.")
            .unwrap();
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn embedding_similarity_without_sentences_is_zero() {
        let scorer = EmbeddingSimilarity::new(InitialEncoder);
        assert_eq!(scorer.similarity("...", "Alpha.").unwrap(), 0.0);
    }

    #[test]
    fn embedding_count_mismatch_is_an_error() {
        let scorer = EmbeddingSimilarity::new(ShortEncoder);
        let err = scorer.similarity("One. Two.", "Three.").unwrap_err();
        assert!(matches!(err, EvalError::CollaboratorUnavailable { .. }));
    }

    #[test]
    fn reduced_weights_without_semantic() {
        let m = validate_accuracy(&source(), TARGET, &SemanticCapability::Absent);
        let expected = 0.6 * m.text_completeness() + 0.4 * m.structure_preservation();
        assert!((m.overall_accuracy() - expected).abs() < 1e-12);
        assert!(!m.semantic_available());
        assert!(!m.recommendations().iter().any(|r| r.starts_with("Semantic")));
    }

    #[test]
    fn semantic_weights_when_positive() {
        let semantic = SemanticCapability::present(FixedScorer(0.5));
        let m = validate_accuracy(&source(), TARGET, &semantic);
        let expected =
            0.4 * m.text_completeness() + 0.3 * m.structure_preservation() + 0.3 * 0.5;
        assert!((m.overall_accuracy() - expected).abs() < 1e-12);
        assert!(m.semantic_weighted());
        assert!(m.recommendations().iter().any(|r| r.starts_with("Semantic")));
    }

    #[test]
    fn scorer_failure_degrades_to_reduced_weights() {
        let semantic = SemanticCapability::present(FailingScorer);
        let m = validate_accuracy(&source(), TARGET, &semantic);
        assert_eq!(m.semantic_similarity(), 0.0);
        assert!(m.semantic_available());
        assert!(!m.semantic_weighted());
        let expected = 0.6 * m.text_completeness() + 0.4 * m.structure_preservation();
        assert!((m.overall_accuracy() - expected).abs() < 1e-12);

        assert_eq!(
            m.semantic_error(),
            Some("failing: collaborator unavailable: failing: model not loaded")
        );
        let recs = m.recommendations();
        assert!(
            !recs.iter().any(|r| r.starts_with("Semantic similarity is low")),
            "recommendations: {recs:?}"
        );
        let explained = recs
            .iter()
            .position(|r| r.starts_with("Semantic similarity could not be computed (failing: "))
            .expect("missing explanation");
        assert!(recs[explained].ends_with("reported as 0 and excluded from the overall score"));
        assert_eq!(explained, recs.len() - 2);
    }

    #[test]
    fn faithful_conversion_scores_high() {
        let m = validate_accuracy(&source(), TARGET, &SemanticCapability::Absent);
        // Only the heading word "results" is extra.
        assert!(m.text_completeness() > 0.9, "{}", m.text_completeness());
        assert_eq!(m.structure_preservation(), 0.8);
    }

    #[test]
    fn single_chunk_covers_all_pages() {
        let m = validate_accuracy(&source(), TARGET, &SemanticCapability::Absent);
        assert_eq!(m.page_count(), 2);
        assert_eq!(m.chunk_details().len(), 1);
        let chunk = &m.chunk_details()[0];
        assert_eq!(chunk.chunk_number, 1);
        assert_eq!(chunk.pages, "1-2");
        assert_eq!(chunk.accuracy, m.overall_accuracy());
    }

    #[test]
    fn capability_debug_names_scorer() {
        let semantic = SemanticCapability::present(FixedScorer(1.0));
        assert_eq!(format!("{semantic:?}"), "Present(\"fixed\")");
        assert_eq!(format!("{:?}", SemanticCapability::default()), "Absent");
    }
}
