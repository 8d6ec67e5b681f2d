// src/engine/similarity.rs

use super::{competency::CompetencyVector, to_percent};

/// Cosine similarity between two competency vectors.
///
/// If either vector has zero magnitude the result is `0`: a course without a
/// profile, or a student without measured competencies, has no affinity.
pub fn cosine_similarity(a: &CompetencyVector, b: &CompetencyVector) -> f64 {
    let mag_a = a.magnitude();
    let mag_b = b.magnitude();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    // Rounding can push a self-comparison a hair past 1.
    (a.dot(b) / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

/// Cosine similarity as a percentage with 2 decimals (0..100 for non-negative input).
pub fn similarity_percent(a: &CompetencyVector, b: &CompetencyVector) -> f64 {
    to_percent(cosine_similarity(a, b))
}
