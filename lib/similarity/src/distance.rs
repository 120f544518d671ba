//! String similarity functions for gene-name matching
//!
//! Every scorer returns a similarity in range [0.0, 100.0] where 100.0 means identical.
//! The building block is the normalized indel similarity (insertions and deletions only,
//! computed from the longest common subsequence). The token and partial variants reuse it
//! on reordered tokens and on aligned substrings.

use std::collections::BTreeSet;

/// Down-weighting applied to token based scores inside [`weighted_ratio`]
const UNBASE_SCALE: f64 = 0.95;

/// Normalized indel similarity between two strings
///
/// `200 * lcs / (len_a + len_b)`. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_ratio(&a, &b)
}

/// Best [`ratio`] of the shorter string against any equally long window of the longer one
///
/// Windows hanging over either end of the longer string are considered too, so that
/// a needle overlapping only a prefix or suffix still scores.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a.len() == b.len() {
        return best_window(&a, &b).max(best_window(&b, &a));
    }

    let (short, long) = if a.len() < b.len() { (&a, &b) } else { (&b, &a) };
    best_window(short, long)
}

/// [`ratio`] after sorting the whitespace separated tokens of both strings
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Set based token similarity
///
/// Compares the shared tokens against each side's remainder, so that a string whose
/// tokens are a subset of the other's scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let mut result = ratio(&diff_ab_joined, &diff_ba_joined);

    if intersection.is_empty() {
        return result;
    }

    // "sect" vs "sect diff" ratios, computed from lengths alone
    let sect_len = intersection.join(" ").chars().count() as f64;
    let ab_len = diff_ab_joined.chars().count() as f64;
    let ba_len = diff_ba_joined.chars().count() as f64;

    let sect_ab_dist = 1.0 + ab_len;
    let sect_ba_dist = 1.0 + ba_len;
    let sect_ab_total = sect_len + sect_len + sect_ab_dist;
    let sect_ba_total = sect_len + sect_len + sect_ba_dist;

    result = result.max(100.0 * (1.0 - sect_ab_dist / sect_ab_total));
    result.max(100.0 * (1.0 - sect_ba_dist / sect_ba_total))
}

/// [`partial_ratio`] over sorted tokens; 100 as soon as both strings share a token
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    if !tokens_a.is_disjoint(&tokens_b) {
        return 100.0;
    }

    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Weighted combination of the scorers above
///
/// Strings of similar length are compared whole and token-wise. Once one string is at
/// least 1.5 times longer, substring alignment takes over, scaled down harder for
/// very uneven lengths. Returns 0.0 if either string is empty.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let end_ratio = ratio(a, b);

    if len_ratio < 1.5 {
        let token_ratio = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        return end_ratio.max(token_ratio * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };

    let end_ratio = end_ratio.max(partial_ratio(a, b) * partial_scale);
    end_ratio.max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programming
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn best_window(short: &[char], long: &[char]) -> f64 {
    let n = short.len();
    let m = long.len();
    let mut best = 0.0f64;

    // Needle overhanging the start of the haystack
    for end in 1..n {
        best = best.max(indel_ratio(short, &long[..end]));
    }

    for start in 0..=(m - n) {
        best = best.max(indel_ratio(short, &long[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }

    // Needle overhanging the end
    for start in (m - n + 1)..m {
        best = best.max(indel_ratio(short, &long[start..]));
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(ratio("mecA", "mecA"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_ratio_lcs() {
        // lcs("blatem", "bla_tem_1") = 6, total length 15
        let sim = ratio("blatem", "bla_tem_1");
        assert!((sim - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_eq!(partial_ratio("tem", "bla_tem_1"), 100.0);
        assert_eq!(partial_ratio("bla_tem_1", "tem"), 100.0);
        assert_eq!(partial_ratio("", "tem"), 0.0);
    }

    #[test]
    fn test_partial_ratio_overhang() {
        // "xmec" only overlaps the start of "meca"
        let sim = partial_ratio("xmec", "mecaaaaa");
        assert!(sim >= 75.0 && sim < 100.0);
    }

    #[test]
    fn test_token_sort_ratio_reordering() {
        assert_eq!(token_sort_ratio("tem bla", "bla tem"), 100.0);
    }

    #[test]
    fn test_token_set_ratio_subset() {
        assert_eq!(token_set_ratio("bla tem", "bla tem 1"), 100.0);
        assert_eq!(token_set_ratio("", "bla"), 0.0);
    }

    #[test]
    fn test_partial_token_ratio_shared_token() {
        assert_eq!(partial_token_ratio("oxa 48", "blaoxa 48"), 100.0);
    }

    #[test]
    fn test_weighted_ratio_bounds() {
        let pairs = [
            ("blatem", "bla_tem_1"),
            ("dfra24", "dfra1"),
            ("meca", "vanA"),
            ("tet(m)", "tetm"),
            ("a", "a very long gene description"),
        ];
        for (a, b) in pairs {
            let sim = weighted_ratio(a, b);
            assert!((0.0..=100.0).contains(&sim), "{} vs {} -> {}", a, b, sim);
            assert!((sim - weighted_ratio(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_weighted_ratio_identical_is_100() {
        assert_eq!(weighted_ratio("dfra24", "dfra24"), 100.0);
        assert_eq!(weighted_ratio("", "dfra24"), 0.0);
    }

    #[test]
    fn test_weighted_ratio_only_identity_reaches_100() {
        assert!(weighted_ratio("tem bla", "bla tem") < 100.0);
        assert!(weighted_ratio("tem", "bla_tem_1") < 100.0);
    }

    #[test]
    fn test_weighted_ratio_prefers_closer_names() {
        let close = weighted_ratio("blatem", "bla_tem_1");
        let far = weighted_ratio("blatem", "mcr-1");
        assert!(close >= 80.0);
        assert!(close > far);
    }
}
