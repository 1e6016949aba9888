//! Fuzzy string ratios on a 0-100 scale.

use super::levenshtein::indel_distance;

/// Similarity of two strings: `100 * (1 - indel / (len_a + len_b))`, rounded.
/// An empty side scores 0.
pub fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    char_ratio(&a, &b)
}

/// Best `ratio` of the shorter string against every equally long window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut best = 0;
    for window in long.windows(short.len()) {
        best = best.max(char_ratio(&short, window));
        if best == 100 {
            break;
        }
    }
    best
}

fn char_ratio(a: &[char], b: &[char]) -> u32 {
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let distance = indel_distance(a, b);
    (100.0 * (total - distance) as f64 / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("quick movie review", "quick movie review"), 100);
        assert_eq!(partial_ratio("movie", "a quick movie review"), 100);
    }

    #[test]
    fn ratio_matches_known_values() {
        // 2 * 7 matching chars out of 16: 87.5 rounds to 88.
        assert_eq!(ratio("this is a", "this is"), 88);
        assert_eq!(ratio("abc", "xyz"), 0);
    }

    #[test]
    fn partial_is_symmetric_in_argument_order() {
        assert_eq!(
            partial_ratio("brown fox", "the quick brown fox jumps"),
            partial_ratio("the quick brown fox jumps", "brown fox")
        );
    }

    #[test]
    fn empty_sides_score_zero() {
        assert_eq!(ratio("", "abc"), 0);
        assert_eq!(partial_ratio("", "abc"), 0);
    }
}
