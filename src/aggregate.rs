use serde::Serialize;

// ---------------------------------------------------------------------------
// Metric tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    WordFidelity,
    GrammarScore,
    HeaderScore,
    Structure,
    ContentRichness,
    Formatting,
    Readability,
    TextCompleteness,
    StructurePreservation,
    SemanticSimilarity,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Self::WordFidelity => "word_fidelity",
            Self::GrammarScore => "grammar_score",
            Self::HeaderScore => "header_score",
            Self::Structure => "structure",
            Self::ContentRichness => "content_richness",
            Self::Formatting => "formatting",
            Self::Readability => "readability",
            Self::TextCompleteness => "text_completeness",
            Self::StructurePreservation => "structure_preservation",
            Self::SemanticSimilarity => "semantic_similarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricScore {
    pub metric: Metric,
    pub value: f64,
}

impl MetricScore {
    pub fn new(metric: Metric, value: f64) -> Self {
        Self { metric, value }
    }
}

fn lookup(scores: &[MetricScore], metric: Metric) -> Option<f64> {
    scores.iter().find(|s| s.metric == metric).map(|s| s.value)
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable {
    weights: &'static [(Metric, f64)],
}

impl WeightTable {
    pub const fn new(weights: &'static [(Metric, f64)]) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &'static [(Metric, f64)] {
        self.weights
    }

    pub fn weight(&self, metric: Metric) -> f64 {
        self.weights
            .iter()
            .find(|(m, _)| *m == metric)
            .map_or(0.0, |(_, w)| *w)
    }

    /// Weighted sum over the table's metrics; a metric with no score counts as 0.
    pub fn combine(&self, scores: &[MetricScore]) -> f64 {
        self.weights
            .iter()
            .map(|(metric, weight)| weight * lookup(scores, *metric).unwrap_or(0.0))
            .sum()
    }
}

pub const COMPARISON_WEIGHTS: WeightTable = WeightTable::new(&[
    (Metric::WordFidelity, 0.6),
    (Metric::GrammarScore, 0.3),
    (Metric::HeaderScore, 0.1),
]);

pub const QUALITY_WEIGHTS: WeightTable = WeightTable::new(&[
    (Metric::Structure, 0.3),
    (Metric::ContentRichness, 0.25),
    (Metric::Formatting, 0.25),
    (Metric::Readability, 0.2),
]);

pub const ACCURACY_WEIGHTS_SEMANTIC: WeightTable = WeightTable::new(&[
    (Metric::TextCompleteness, 0.4),
    (Metric::StructurePreservation, 0.3),
    (Metric::SemanticSimilarity, 0.3),
]);

pub const ACCURACY_WEIGHTS_REDUCED: WeightTable = WeightTable::new(&[
    (Metric::TextCompleteness, 0.6),
    (Metric::StructurePreservation, 0.4),
]);

// ---------------------------------------------------------------------------
// Grade bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyGrade {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl AccuracyGrade {
    pub fn from_fraction(score: f64) -> Self {
        if score >= 0.9 {
            Self::Excellent
        } else if score >= 0.8 {
            Self::Good
        } else if score >= 0.7 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn from_percent(score: f64) -> Self {
        Self::from_fraction(score / 100.0)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn range(self) -> &'static str {
        match self {
            Self::Excellent => "90%+",
            Self::Good => "80-89%",
            Self::Fair => "70-79%",
            Self::NeedsImprovement => "<70%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl QualityGrade {
    pub fn from_fraction(score: f64) -> Self {
        if score >= 0.9 {
            Self::Excellent
        } else if score >= 0.8 {
            Self::VeryGood
        } else if score >= 0.7 {
            Self::Good
        } else if score >= 0.6 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn range(self) -> &'static str {
        match self {
            Self::Excellent => "90%+",
            Self::VeryGood => "80-89%",
            Self::Good => "70-79%",
            Self::Fair => "60-69%",
            Self::NeedsImprovement => "<60%",
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Appends `message` when the metric is present and scores below `below`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCheck {
    pub metric: Metric,
    pub below: f64,
    pub message: &'static str,
}

/// Chosen when the overall score is strictly greater than `above`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosingRemark {
    pub above: f64,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRules {
    pub checks: Vec<ThresholdCheck>,
    pub closings: Vec<ClosingRemark>,
    pub fallback: &'static str,
}

impl RecommendationRules {
    pub fn recommend(&self, scores: &[MetricScore], overall: f64) -> Vec<String> {
        let mut out: Vec<String> = self
            .checks
            .iter()
            .filter(|check| lookup(scores, check.metric).is_some_and(|v| v < check.below))
            .map(|check| check.message.to_string())
            .collect();

        let closing = self
            .closings
            .iter()
            .find(|c| overall > c.above)
            .map_or(self.fallback, |c| c.message);
        out.push(closing.to_string());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_sum_to_one() {
        for table in [
            COMPARISON_WEIGHTS,
            QUALITY_WEIGHTS,
            ACCURACY_WEIGHTS_SEMANTIC,
            ACCURACY_WEIGHTS_REDUCED,
        ] {
            let total: f64 = table.weights().iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn combine_ignores_untracked_and_zeroes_missing() {
        let scores = [
            MetricScore::new(Metric::WordFidelity, 100.0),
            MetricScore::new(Metric::Readability, 55.0),
        ];
        assert!((COMPARISON_WEIGHTS.combine(&scores) - 60.0).abs() < 1e-9);
        assert_eq!(COMPARISON_WEIGHTS.weight(Metric::Readability), 0.0);
    }

    #[test]
    fn accuracy_grade_has_four_bands() {
        assert_eq!(AccuracyGrade::from_fraction(0.95), AccuracyGrade::Excellent);
        assert_eq!(AccuracyGrade::from_fraction(0.85), AccuracyGrade::Good);
        assert_eq!(AccuracyGrade::from_fraction(0.7), AccuracyGrade::Fair);
        assert_eq!(AccuracyGrade::from_fraction(0.65), AccuracyGrade::NeedsImprovement);
        assert_eq!(AccuracyGrade::from_percent(90.0), AccuracyGrade::Excellent);
        assert_eq!(AccuracyGrade::from_percent(79.9), AccuracyGrade::Fair);
    }

    #[test]
    fn quality_grade_has_five_bands() {
        assert_eq!(QualityGrade::from_fraction(0.9), QualityGrade::Excellent);
        assert_eq!(QualityGrade::from_fraction(0.8), QualityGrade::VeryGood);
        assert_eq!(QualityGrade::from_fraction(0.75), QualityGrade::Good);
        assert_eq!(QualityGrade::from_fraction(0.6), QualityGrade::Fair);
        assert_eq!(QualityGrade::from_fraction(0.59), QualityGrade::NeedsImprovement);
    }

    fn rules() -> RecommendationRules {
        RecommendationRules {
            checks: vec![
                ThresholdCheck {
                    metric: Metric::Structure,
                    below: 0.6,
                    message: "structure",
                },
                ThresholdCheck {
                    metric: Metric::Readability,
                    below: 0.7,
                    message: "readability",
                },
                ThresholdCheck {
                    metric: Metric::SemanticSimilarity,
                    below: 0.7,
                    message: "semantic",
                },
            ],
            closings: vec![
                ClosingRemark {
                    above: 0.85,
                    message: "excellent",
                },
                ClosingRemark {
                    above: 0.7,
                    message: "good",
                },
            ],
            fallback: "attention",
        }
    }

    #[test]
    fn failed_checks_come_first_in_declared_order() {
        let scores = [
            MetricScore::new(Metric::Readability, 0.1),
            MetricScore::new(Metric::Structure, 0.1),
        ];
        assert_eq!(
            rules().recommend(&scores, 0.2),
            vec!["structure", "readability", "attention"]
        );
    }

    #[test]
    fn absent_metrics_are_not_checked() {
        let scores = [
            MetricScore::new(Metric::Structure, 0.9),
            MetricScore::new(Metric::Readability, 0.9),
        ];
        assert_eq!(rules().recommend(&scores, 0.9), vec!["excellent"]);
    }

    #[test]
    fn closing_cut_points_are_strict() {
        assert_eq!(rules().recommend(&[], 0.85), vec!["good"]);
        assert_eq!(rules().recommend(&[], 0.7), vec!["attention"]);
    }
}
