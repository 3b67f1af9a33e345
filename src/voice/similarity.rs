//! Edit-distance string similarity

/// Base score for a containment relationship between two strings
const CONTAINMENT_BASE: f32 = 0.7;

/// Span added on top of the base in proportion to the length ratio
const CONTAINMENT_SPAN: f32 = 0.2;

/// Similarity of two (already normalized) strings in [0, 1]
///
/// Equal strings score 1.0 and an empty side scores 0.0. When one string
/// contains the other the score falls in 0.7..=0.9 by length ratio;
/// otherwise it is the normalized Levenshtein similarity.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let longer = a_len.max(b_len);

    if a.contains(b) || b.contains(a) {
        let shorter = a_len.min(b_len);
        return CONTAINMENT_BASE + (shorter as f32 / longer as f32) * CONTAINMENT_SPAN;
    }

    1.0 - levenshtein(a, b) as f32 / longer as f32
}

/// Levenshtein distance counted in characters
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b.len()]
}
