use std::collections::HashMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Multiset
// ---------------------------------------------------------------------------

/// Occurrence counts per token, iterated in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordMultiset {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl WordMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_n(&mut self, token: &str, n: usize) {
        if n == 0 {
            return;
        }
        match self.counts.get_mut(token) {
            Some(count) => *count += n,
            None => {
                self.counts.insert(token.to_string(), n);
                self.order.push(token.to_string());
            }
        }
    }

    pub fn insert(&mut self, token: &str) {
        self.insert_n(token, 1);
    }

    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn distinct(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(move |token| (token.as_str(), self.counts[token]))
    }

    pub fn intersection(&self, other: &WordMultiset) -> WordMultiset {
        let mut out = WordMultiset::new();
        for (token, count) in self.iter() {
            out.insert_n(token, count.min(other.count(token)));
        }
        out
    }

    pub fn difference(&self, other: &WordMultiset) -> WordMultiset {
        let mut out = WordMultiset::new();
        for (token, count) in self.iter() {
            out.insert_n(token, count.saturating_sub(other.count(token)));
        }
        out
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordMultiset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = WordMultiset::new();
        for token in iter {
            set.insert(token.as_ref());
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// `100 × |source ∩ target| / |source|` over occurrence counts; 0 for an empty source.
pub fn word_fidelity<S: AsRef<str>>(source: &[S], target: &[S]) -> f64 {
    let source_set: WordMultiset = source.iter().collect();
    let target_set: WordMultiset = target.iter().collect();
    fidelity_of(&source_set, &target_set)
}

fn fidelity_of(source: &WordMultiset, target: &WordMultiset) -> f64 {
    let total_source = source.total();
    if total_source == 0 {
        return 0.0;
    }
    let common = source.intersection(target).total();
    100.0 * common as f64 / total_source as f64
}

/// Source tokens missing from the target, wholly or in excess count.
pub fn missing_words<S: AsRef<str>>(source: &[S], target: &[S]) -> Vec<WordCount> {
    let source_set: WordMultiset = source.iter().collect();
    let target_set: WordMultiset = target.iter().collect();
    source_set
        .difference(&target_set)
        .iter()
        .map(WordCount::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

impl From<(&str, usize)> for WordCount {
    fn from((word, count): (&str, usize)) -> Self {
        Self {
            word: word.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FidelityBreakdown {
    pub score: f64,
    pub source_words: usize,
    pub target_words: usize,
    pub source_unique: usize,
    pub target_unique: usize,
    pub common_unique: usize,
    pub common_occurrences: usize,
    pub missing: Vec<WordCount>,
    pub preserved: Vec<String>,
}

impl FidelityBreakdown {
    pub fn compute<S: AsRef<str>>(source: &[S], target: &[S]) -> Self {
        let source_set: WordMultiset = source.iter().collect();
        let target_set: WordMultiset = target.iter().collect();
        let common = source_set.intersection(&target_set);

        Self {
            score: fidelity_of(&source_set, &target_set),
            source_words: source_set.total(),
            target_words: target_set.total(),
            source_unique: source_set.distinct(),
            target_unique: target_set.distinct(),
            common_unique: common.distinct(),
            common_occurrences: common.total(),
            missing: source_set
                .difference(&target_set)
                .iter()
                .map(WordCount::from)
                .collect(),
            preserved: common.iter().map(|(w, _)| w.to_string()).collect(),
        }
    }

    pub fn limit_samples(mut self, n: usize) -> Self {
        self.missing.truncate(n);
        self.preserved.truncate(n);
        self
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FidelityAssessment {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl FidelityAssessment {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 75.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - Nearly all words preserved in conversion",
            Self::Good => "Good - Most words preserved with minor gaps",
            Self::Moderate => "Moderate - Significant word gaps identified",
            Self::Poor => "Poor - Major word loss in conversion",
        }
    }

    pub fn impact(self) -> &'static str {
        match self {
            Self::Excellent => "The conversion maintained very high content fidelity",
            Self::Good => "The conversion maintained acceptable content fidelity",
            Self::Moderate => "Conversion quality needs improvement",
            Self::Poor => "Conversion quality is inadequate for business use",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordFidelityReport {
    pub breakdown: FidelityBreakdown,
    pub assessment: FidelityAssessment,
    /// Fidelity is high enough for structure and grammar results to be meaningful.
    pub foundation_solid: bool,
}

impl WordFidelityReport {
    pub fn new(breakdown: FidelityBreakdown, foundation_threshold: f64) -> Self {
        let assessment = FidelityAssessment::from_score(breakdown.score);
        let foundation_solid = breakdown.score >= foundation_threshold;
        Self {
            breakdown,
            assessment,
            foundation_solid,
        }
    }
}
