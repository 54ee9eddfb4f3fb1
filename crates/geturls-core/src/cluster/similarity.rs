//! Textual similarity between short names.
//!
//! `ratio` is the matching-blocks measure `2 * M / (len(a) + len(b))`, where `M`
//! counts characters in the longest common block plus, recursively, the blocks
//! to its left and right.

/// Default number of close matches returned.
pub const DEFAULT_MATCHES: usize = 3;
/// Minimum ratio for two names to count as close.
pub const DEFAULT_CUTOFF: f64 = 0.6;

/// Similarity of `a` and `b` in `[0, 1]`; two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matched_chars(&a[..i], &b[..j]) + matched_chars(&a[i + k..], &b[j + k..])
}

/// Longest common block as `(start_a, start_b, len)`; ties go to the earliest start in `a`, then `b`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

/// Up to `n` entries of `candidates` whose ratio to `word` is at least `cutoff`,
/// best first (ties by name).
pub fn close_matches<'a, I>(word: &str, candidates: I, n: usize, cutoff: f64) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(f64, &'a str)> = candidates
        .into_iter()
        .map(|c| (ratio(word, c), c))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(n).map(|(_, c)| c).collect()
}
