use std::collections::HashMap;

use tracing::debug;

use crate::normalize::normalize_for_comparison;

/// Budget for one LCS table. Past it a line diff shows the changed middle as
/// one block replacement and text similarity counts the middle's shared
/// words without regard to order.
const MAX_TABLE_CELLS: usize = 4_000_000;

const SOURCE_LABEL: &str = "source";
const TARGET_LABEL: &str = "target";

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

fn common_ends<T: PartialEq>(a: &[T], b: &[T]) -> (usize, usize) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, suffix)
}

pub fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let (prefix, suffix) = common_ends(a, b);
    let a = &a[prefix..a.len() - suffix];
    let b = &b[prefix..b.len() - suffix];

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prefix + suffix + prev[b.len()]
}

pub fn similarity_ratio<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    ratio(lcs_len(a, b), a.len() + b.len())
}

fn ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    2.0 * matched as f64 / total as f64
}

/// Words shared in order, or by multiset overlap once the changed middle
/// exceeds `max_cells`. The overlap is an upper bound on the exact count.
fn matched_words(a: &[&str], b: &[&str], max_cells: usize) -> usize {
    let (prefix, suffix) = common_ends(a, b);
    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];
    let cells = mid_a.len().saturating_mul(mid_b.len());
    let middle = if cells > max_cells {
        debug!(
            source_words = mid_a.len(),
            target_words = mid_b.len(),
            "similarity table over budget; counting shared words"
        );
        multiset_overlap(mid_a, mid_b)
    } else {
        lcs_len(mid_a, mid_b)
    };
    prefix + suffix + middle
}

fn multiset_overlap(a: &[&str], b: &[&str]) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in a {
        *counts.entry(*word).or_insert(0) += 1;
    }
    b.iter()
        .filter(|word| match counts.get_mut(*word) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count()
}

/// Order-aware similarity of two texts over their normalized word sequences.
///
/// Very large inputs fall back to order-free word overlap for the part that
/// differs.
pub fn text_similarity(source: &str, target: &str) -> f64 {
    let source = normalize_for_comparison(source);
    let target = normalize_for_comparison(target);
    let a: Vec<&str> = source.split_whitespace().collect();
    let b: Vec<&str> = target.split_whitespace().collect();
    ratio(matched_words(&a, &b, MAX_TABLE_CELLS), a.len() + b.len())
}

// ---------------------------------------------------------------------------
// Line diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Keep,
    Remove,
    Add,
}

fn edit_script(a: &[&str], b: &[&str], max_cells: usize) -> Vec<Edit> {
    let (prefix, suffix) = common_ends(a, b);
    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let mut edits = vec![Edit::Keep; prefix];
    let cells = (mid_a.len() + 1).saturating_mul(mid_b.len() + 1);
    if cells > max_cells {
        edits.extend(std::iter::repeat(Edit::Remove).take(mid_a.len()));
        edits.extend(std::iter::repeat(Edit::Add).take(mid_b.len()));
    } else {
        edits.extend(exact_middle(mid_a, mid_b));
    }
    edits.extend(std::iter::repeat(Edit::Keep).take(suffix));
    edits
}

/// Full LCS table over the suffixes, walked forward; removals before additions.
fn exact_middle(a: &[&str], b: &[&str]) -> Vec<Edit> {
    let width = b.len() + 1;
    let mut table = vec![0u32; (a.len() + 1) * width];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut edits = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            edits.push(Edit::Keep);
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            edits.push(Edit::Remove);
            i += 1;
        } else {
            edits.push(Edit::Add);
            j += 1;
        }
    }
    edits.extend(std::iter::repeat(Edit::Remove).take(a.len() - i));
    edits.extend(std::iter::repeat(Edit::Add).take(b.len() - j));
    edits
}

pub fn unified_diff(source: &str, target: &str, context: usize, max_lines: usize) -> Vec<String> {
    let a: Vec<&str> = source.lines().collect();
    let b: Vec<&str> = target.lines().collect();
    let mut out = render_hunks(&a, &b, &edit_script(&a, &b, MAX_TABLE_CELLS), context);
    out.truncate(max_lines);
    out
}

fn render_hunks(a: &[&str], b: &[&str], edits: &[Edit], context: usize) -> Vec<String> {
    let changes: Vec<usize> = edits
        .iter()
        .enumerate()
        .filter(|(_, e)| **e != Edit::Keep)
        .map(|(k, _)| k)
        .collect();
    if changes.is_empty() {
        return Vec::new();
    }

    // Line positions in `a` and `b` before each edit.
    let mut positions = Vec::with_capacity(edits.len() + 1);
    let (mut i, mut j) = (0, 0);
    for edit in edits {
        positions.push((i, j));
        match edit {
            Edit::Keep => {
                i += 1;
                j += 1;
            }
            Edit::Remove => i += 1,
            Edit::Add => j += 1,
        }
    }
    positions.push((i, j));

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &k in &changes {
        match groups.last_mut() {
            Some((_, last)) if k - *last - 1 <= 2 * context => *last = k,
            _ => groups.push((k, k)),
        }
    }

    let mut out = vec![format!("--- {SOURCE_LABEL}"), format!("+++ {TARGET_LABEL}")];
    for (first, last) in groups {
        let start = first.saturating_sub(context);
        let end = (last + context + 1).min(edits.len());
        let (a_start, b_start) = positions[start];
        let (a_end, b_end) = positions[end];
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(a_start, a_end - a_start),
            format_range(b_start, b_end - b_start)
        ));
        for k in start..end {
            let (ai, bj) = positions[k];
            out.push(match edits[k] {
                Edit::Keep => format!(" {}", a[ai]),
                Edit::Remove => format!("-{}", a[ai]),
                Edit::Add => format!("+{}", b[bj]),
            });
        }
    }
    out
}

fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcs_basics() {
        assert_eq!(lcs_len(&[1, 2, 3, 4], &[1, 3, 4]), 3);
        assert_eq!(lcs_len(&[1, 2, 3], &[4, 5]), 0);
        assert_eq!(lcs_len::<u8>(&[], &[1]), 0);
        assert_eq!(lcs_len(&["a", "b", "c", "d"], &["b", "d", "a"]), 2);
    }

    #[test]
    fn ratio_edge_cases() {
        assert_eq!(similarity_ratio::<u8>(&[], &[]), 1.0);
        assert_eq!(similarity_ratio(&[1], &[]), 0.0);
        assert_eq!(similarity_ratio(&[1, 2], &[1, 2]), 1.0);
        assert!((similarity_ratio(&[1, 2, 3, 4], &[1, 2]) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn text_similarity_ignores_markup_and_case() {
        let source = "Quarterly revenue grew in every region.";
        let target = "## Quarterly Revenue\n\n**grew** in every region.";
        assert_eq!(text_similarity(source, target), 1.0);
    }

    #[test]
    fn text_similarity_drops_with_missing_words() {
        let score = text_similarity("one two three four", "one two");
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn over_budget_middle_counts_shared_words() {
        let a = ["head", "one", "two", "three", "tail"];
        let b = ["head", "three", "two", "one", "four", "tail"];
        assert_eq!(matched_words(&a, &b, 1_000), 3);
        assert_eq!(matched_words(&a, &b, 4), 5);
    }

    #[test]
    fn overlap_respects_multiplicity() {
        assert_eq!(multiset_overlap(&["a", "a", "b"], &["a", "b", "b", "c"]), 2);
    }

    fn letters(mut n: usize) -> String {
        let mut word = String::new();
        for _ in 0..4 {
            word.push((b'a' + (n % 26) as u8) as char);
            n /= 26;
        }
        word
    }

    #[test]
    fn large_texts_finish_with_expected_value() {
        let body: Vec<String> = (0..150_000).map(letters).collect();
        let body = body.join(" ");
        let source = format!("preface {body} appendix");
        let target = format!("# Title\n\n{body}\n\nfootnote");
        // 150,000 shared words out of 150,002 on each side
        let score = text_similarity(&source, &target);
        assert!((score - 300_000.0 / 300_004.0).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn identical_texts_have_no_diff() {
        assert!(unified_diff("a\nb\n", "a\nb\n", 3, 20).is_empty());
    }

    #[test]
    fn single_line_change() {
        let lines = unified_diff("a\nb\nc", "a\nB\nc", 3, 20);
        assert_eq!(
            lines,
            vec!["--- source", "+++ target", "@@ -1,3 +1,3 @@", " a", "-b", "+B", " c"]
        );
    }

    #[test]
    fn far_apart_changes_form_separate_hunks() {
        let source: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        let mut target = source.clone();
        target[1] = "changed 1".into();
        target[18] = "changed 18".into();
        let lines = unified_diff(&source.join("\n"), &target.join("\n"), 3, 100);
        let hunks: Vec<&String> = lines.iter().filter(|l| l.starts_with("@@")).collect();
        assert_eq!(hunks, vec!["@@ -1,5 +1,5 @@", "@@ -16,5 +16,5 @@"]);
    }

    #[test]
    fn pure_insertion_uses_empty_range() {
        let lines = unified_diff("", "new", 3, 20);
        assert_eq!(lines[2], "@@ -0,0 +1 @@");
        assert_eq!(lines[3], "+new");
    }

    #[test]
    fn diff_is_truncated() {
        let lines = unified_diff("a\nb\nc\nd", "w\nx\ny\nz", 3, 5);
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn oversized_middle_becomes_block_replace() {
        let a = ["k", "x", "y", "k2"];
        let b = ["k", "y", "x", "k2"];
        let edits = edit_script(&a, &b, 1);
        assert_eq!(
            edits,
            vec![
                Edit::Keep,
                Edit::Remove,
                Edit::Remove,
                Edit::Add,
                Edit::Add,
                Edit::Keep
            ]
        );
        let exact = edit_script(&a, &b, MAX_TABLE_CELLS);
        assert_eq!(exact.iter().filter(|e| **e == Edit::Keep).count(), 3);
    }
}
