//! Edit distances over Unicode scalar values.

/// Characters of the text a Levenshtein difference is computed on.
pub const MAX_COMPARED_CHARS: usize = 255;

/// Levenshtein distance: insertions, deletions, and substitutions all cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    weighted_distance(&a, &b, 1)
}

/// Insertions and deletions only (a substitution costs 2).
pub fn indel_distance(a: &[char], b: &[char]) -> usize {
    weighted_distance(a, b, 2)
}

/// `levenshtein(text[..255], query) / len(text[..255])`.
///
/// `None` for empty text, which has no defined difference.
pub fn levenshtein_difference(text: &str, query: &str) -> Option<f64> {
    let compared: String = text.chars().take(MAX_COMPARED_CHARS).collect();
    let len = compared.chars().count();
    if len == 0 {
        return None;
    }
    Some(levenshtein(&compared, query) as f64 / len as f64)
}

fn weighted_distance(a: &[char], b: &[char], substitution: usize) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let replace = prev[j] + if ca == cb { 0 } else { substitution };
            curr[j + 1] = replace.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
