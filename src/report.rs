use crate::accuracy::AccuracyMetrics;
use crate::aggregate::{
    AccuracyGrade, QualityGrade, WeightTable, ACCURACY_WEIGHTS_REDUCED, ACCURACY_WEIGHTS_SEMANTIC,
    COMPARISON_WEIGHTS, QUALITY_WEIGHTS,
};
use crate::engine::ComparisonReport;
use crate::fidelity::WordFidelityReport;
use crate::quality::QualityMetrics;

#[derive(Default)]
struct Doc {
    out: String,
}

impl Doc {
    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn heading(&mut self, text: &str) {
        self.blank();
        self.line(text);
    }

    fn numbered(&mut self, items: &[String]) {
        for (i, item) in items.iter().enumerate() {
            self.line(format!("{}. {item}", i + 1));
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

pub fn score(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn accuracy_grade_line(grade: AccuracyGrade) -> String {
    let marker = match grade {
        AccuracyGrade::Excellent => "🟢",
        AccuracyGrade::Good => "🟡",
        AccuracyGrade::Fair => "🟠",
        AccuracyGrade::NeedsImprovement => "🔴",
    };
    format!("{marker} **{}** ({})", grade.label(), grade.range())
}

fn quality_grade_line(grade: QualityGrade) -> String {
    let marker = match grade {
        QualityGrade::Excellent | QualityGrade::VeryGood => "🟢",
        QualityGrade::Good => "🟡",
        QualityGrade::Fair => "🟠",
        QualityGrade::NeedsImprovement => "🔴",
    };
    format!("{marker} **{}** ({})", grade.label(), grade.range())
}

fn weights_line(table: WeightTable) -> String {
    table
        .weights()
        .iter()
        .map(|(metric, weight)| format!("{} {:.0}%", metric.name(), weight * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sample_line(words: &[String]) -> String {
    if words.is_empty() {
        "(none)".to_string()
    } else {
        words.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

pub fn render_comparison(report: &ComparisonReport, generated: &str) -> String {
    let m = &report.metrics;
    let b = &report.fidelity.breakdown;
    let mut doc = Doc::default();

    doc.line("# Document Conversion Comparison Report");
    doc.line(format!("Generated: {generated}"));

    doc.heading("## Overall Results");
    doc.line(format!("- **Overall Score**: {}", score(m.overall_score())));
    doc.line(format!("- **Word Fidelity**: {} (priority 1)", score(m.word_fidelity())));
    doc.line(format!("- **Grammar Structure**: {} (priority 2)", score(m.grammar_score())));
    doc.line(format!("- **Header Structure**: {} (priority 3)", score(m.header_score())));

    doc.heading("## Grade");
    doc.line(accuracy_grade_line(report.grade));

    doc.heading("## Detailed Analysis");
    doc.heading(&format!("### Word Fidelity ({})", score(m.word_fidelity())));
    doc.line("Share of source word occurrences that reappear in the converted text.");
    doc.line(format!(
        "- Source words: {} total, {} unique",
        thousands(b.source_words),
        thousands(b.source_unique)
    ));
    doc.line(format!(
        "- Target words: {} total, {} unique",
        thousands(b.target_words),
        thousands(b.target_unique)
    ));
    doc.line(format!(
        "- Common words: {} unique types, {} occurrences",
        thousands(b.common_unique),
        thousands(b.common_occurrences)
    ));
    doc.line(format!("- Assessment: {}", report.fidelity.assessment.summary()));
    doc.line(format!("- Sample missing words: {}", sample_line(&missing_sample(&report.fidelity))));

    doc.heading(&format!("### Grammar Structure ({})", score(m.grammar_score())));
    doc.line("Sentence-count parity between the source and the converted text.");
    doc.line(format!("- Source sentences: {}", thousands(report.source_sentences)));
    doc.line(format!("- Target sentences: {}", thousands(report.target_sentences)));

    doc.heading(&format!("### Header Structure ({})", score(m.header_score())));
    doc.line("Markdown headings in the converted text, twenty points each.");
    doc.line(format!("- Markdown headings: {}", report.headings.markdown_count));
    for (i, heading) in report.headings.markdown_sample.iter().enumerate() {
        doc.line(format!("  - H{}: {heading}", i + 1));
    }
    doc.line(format!(
        "- Potential source headers: {}",
        report.headings.potential_source_count
    ));
    for (i, heading) in report.headings.potential_source_sample.iter().enumerate() {
        doc.line(format!("  - {}: {heading}", i + 1));
    }

    doc.heading("## Differences");
    if report.diff_preview.is_empty() {
        doc.line("No line-by-line differences found");
    } else {
        doc.line("```diff");
        for line in &report.diff_preview {
            doc.line(line);
        }
        doc.line("```");
    }

    doc.heading("## Recommendations");
    doc.numbered(&report.recommendations);

    doc.heading("## Technical Details");
    doc.line("- Word Fidelity: multiset intersection over normalized words of three or more letters");
    doc.line("- Grammar Structure: sentence count ratio");
    doc.line("- Header Structure: markdown heading count");
    doc.line(format!("- Weights: {}", weights_line(COMPARISON_WEIGHTS)));
    doc.out
}

fn missing_sample(report: &WordFidelityReport) -> Vec<String> {
    report
        .breakdown
        .missing
        .iter()
        .map(|w| w.word.clone())
        .collect()
}

pub fn render_fidelity(report: &WordFidelityReport, generated: &str) -> String {
    let b = &report.breakdown;
    let mut doc = Doc::default();

    doc.line("# Word Fidelity Validation Report");
    doc.line(format!("Generated: {generated}"));

    doc.heading("## Overall Results");
    doc.line(format!("- **Word Fidelity Score**: {}", score(b.score)));
    doc.line(format!("- **Assessment**: {}", report.assessment.summary()));
    doc.line(format!("- **Impact**: {}", report.assessment.impact()));

    doc.heading("## Foundation");
    if report.foundation_solid {
        doc.line("[FOUNDATION SOLID] Ready to proceed with grammar and formatting validation");
    } else {
        doc.line("[FOUNDATION ISSUES] Word fidelity below the foundation threshold - investigate before adding grammar/formatting checks");
    }

    doc.heading("## Detailed Analysis");
    doc.line(format!(
        "- Source: {} total words, {} unique",
        thousands(b.source_words),
        thousands(b.source_unique)
    ));
    doc.line(format!(
        "- Target: {} total words, {} unique",
        thousands(b.target_words),
        thousands(b.target_unique)
    ));
    doc.line(format!("- Common word types: {}", thousands(b.common_unique)));
    doc.line(format!("- Common word occurrences: {}", thousands(b.common_occurrences)));
    doc.line(format!("- Sample missing words: {}", sample_line(&missing_sample(report))));
    doc.line(format!("- Sample preserved words: {}", sample_line(&b.preserved)));

    doc.heading("## Technical Details");
    doc.line("- Words: lowercase, alphabetic, three or more letters, markup removed");
    doc.line("- Score: source word occurrences found in the target, counting repeats");
    doc.out
}

pub fn render_quality(metrics: &QualityMetrics, generated: &str) -> String {
    let mut doc = Doc::default();

    doc.line("# Document Quality Analysis Report");
    doc.line(format!("Generated: {generated}"));

    doc.heading("## Overall Results");
    doc.line(format!("- **Overall Quality Score**: {}", percent(metrics.overall_quality())));
    doc.line(format!("- **Structure Score**: {}", percent(metrics.structure())));
    doc.line(format!("- **Content Richness Score**: {}", percent(metrics.content_richness())));
    doc.line(format!("- **Formatting Score**: {}", percent(metrics.formatting())));
    doc.line(format!("- **Readability Score**: {}", percent(metrics.readability())));

    doc.heading("## Grade");
    doc.line(quality_grade_line(metrics.grade()));

    doc.heading("## Document Statistics");
    doc.line(format!("- **Estimated Pages Processed**: {}", metrics.estimated_pages()));
    doc.line(format!("- **Total Word Count**: {}", thousands(metrics.word_count())));
    doc.line(format!(
        "- **Average Words Per Page**: {}",
        thousands(metrics.word_count() / metrics.estimated_pages().max(1))
    ));

    doc.heading("## Detailed Analysis");
    doc.heading(&format!("### Document Structure ({})", percent(metrics.structure())));
    doc.line("Evaluates the presence and quality of headers, lists, and other structural elements.");
    doc.heading(&format!("### Content Richness ({})", percent(metrics.content_richness())));
    doc.line("Measures the completeness and variety of content captured in the conversion.");
    doc.heading(&format!("### Formatting Quality ({})", percent(metrics.formatting())));
    doc.line("Assesses the proper use of Markdown syntax and formatting consistency.");
    doc.heading(&format!("### Readability ({})", percent(metrics.readability())));
    doc.line("Analyzes sentence structure, flow, and overall text readability.");

    doc.heading("## Recommendations");
    doc.numbered(metrics.recommendations());

    doc.heading("## Technical Details");
    doc.line("- Analysis Method: Markdown content quality assessment");
    doc.line("- Source Text: not required");
    doc.line(format!("- Weights: {}", weights_line(QUALITY_WEIGHTS)));
    doc.out
}

pub fn render_accuracy(
    metrics: &AccuracyMetrics,
    provider: Option<&str>,
    generated: &str,
) -> String {
    let mut doc = Doc::default();

    doc.line("# Document Conversion Accuracy Report");
    doc.line(format!("Generated: {generated}"));

    doc.heading("## Overall Results");
    doc.line(format!("- **Overall Accuracy**: {}", percent(metrics.overall_accuracy())));
    doc.line(format!("- **Text Completeness**: {}", percent(metrics.text_completeness())));
    doc.line(format!(
        "- **Structure Preservation**: {}",
        percent(metrics.structure_preservation())
    ));
    doc.line(format!("- **Semantic Similarity**: {}", percent(metrics.semantic_similarity())));

    doc.heading("## Grade");
    doc.line(accuracy_grade_line(metrics.grade()));

    doc.heading("## Detailed Analysis");
    doc.heading(&format!("### Text Completeness ({})", percent(metrics.text_completeness())));
    doc.line("Measures how much of the source text was captured in the converted text.");
    doc.heading(&format!(
        "### Structure Preservation ({})",
        percent(metrics.structure_preservation())
    ));
    doc.line("Evaluates how well document structure (headers, lists, formatting) was maintained.");
    doc.heading(&format!(
        "### Semantic Similarity ({})",
        percent(metrics.semantic_similarity())
    ));
    if metrics.semantic_weighted() {
        doc.line("Analyzes how well the meaning and context of the content was preserved.");
    } else if metrics.semantic_error().is_some() {
        doc.line("Scorer failed; reported as 0 and excluded from the overall score.");
    } else if metrics.semantic_available() {
        doc.line("Scorer returned no similarity; excluded from the overall score.");
    } else {
        doc.line("Not available - no semantic scorer configured.");
    }

    doc.heading("## Chunk Details");
    for chunk in metrics.chunk_details() {
        doc.heading(&format!("### Chunk {} (Pages {})", chunk.chunk_number, chunk.pages));
        doc.line(format!("- **Accuracy**: {}", percent(chunk.accuracy)));
        doc.line(format!("- **Notes**: {}", chunk.notes));
    }

    doc.heading("## Recommendations");
    doc.numbered(metrics.recommendations());

    let weights = if metrics.semantic_weighted() {
        ACCURACY_WEIGHTS_SEMANTIC
    } else {
        ACCURACY_WEIGHTS_REDUCED
    };
    doc.heading("## Technical Details");
    doc.line(format!(
        "- Semantic Analysis Available: {}",
        metrics.semantic_scorer().unwrap_or("no")
    ));
    if let Some(reason) = metrics.semantic_error() {
        doc.line(format!("- Semantic Analysis Error: {reason}"));
    }
    doc.line(format!("- Source Text Provider: {}", provider.unwrap_or("supplied by caller")));
    doc.line("- Text Similarity: longest common subsequence over normalized words");
    doc.line("- Structure Analysis: Regex pattern matching");
    doc.line(format!("- Weights: {}", weights_line(weights)));
    doc.out
}
