//! Similarity matcher: pure comparisons between two fingerprints of the same kind.

const COSINE_EPSILON: f32 = 1e-9;

/// Cosine similarity in `[-1, 1]`. Empty or different-length inputs give `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt() + COSINE_EPSILON)
}

/// `1 - hamming / bits` over two hex strings. Different lengths, empty input or a non-hex
/// digit give `0.0`.
pub fn hash_similarity(h1: &str, h2: &str) -> f32 {
    if h1.is_empty() || h1.len() != h2.len() {
        return 0.0;
    }
    let mut distance = 0u32;
    for (c1, c2) in h1.chars().zip(h2.chars()) {
        match (c1.to_digit(16), c2.to_digit(16)) {
            (Some(a), Some(b)) => distance += (a ^ b).count_ones(),
            _ => return 0.0,
        }
    }
    let bits = (h1.len() * 4) as f32;
    1.0 - distance as f32 / bits
}
