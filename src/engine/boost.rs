// src/engine/boost.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_POPULARITY_WEIGHT: f64 = 0.12;
pub const DEFAULT_RATING_WEIGHT: f64 = 0.10;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.05;
pub const DEFAULT_ELIGIBILITY_WEIGHT: f64 = 0.08;

/// Courses older than this get no recency bonus.
const RECENCY_WINDOW_DAYS: f64 = 365.0;
const MAX_COLLEGE_RATING: f64 = 5.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Per-factor weights for the additive business boosts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostWeights {
    pub popularity: f64,
    pub rating: f64,
    pub recency: f64,
    pub eligibility: f64,
}

impl Default for BoostWeights {
    fn default() -> Self {
        Self {
            popularity: DEFAULT_POPULARITY_WEIGHT,
            rating: DEFAULT_RATING_WEIGHT,
            recency: DEFAULT_RECENCY_WEIGHT,
            eligibility: DEFAULT_ELIGIBILITY_WEIGHT,
        }
    }
}

/// The candidate attributes the boosts look at. All optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoostSignals {
    pub enrollment_count: Option<i64>,
    /// College rating on a 0..5 scale.
    pub college_rating: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    /// Placeholder: no eligibility rules exist yet, callers pass `false`.
    pub eligible: bool,
}

/// Popularity term: logarithmic so it saturates for large enrollments.
pub fn popularity_boost(enrollment_count: i64, weight: f64) -> f64 {
    (enrollment_count.max(0) as f64).ln_1p() / 10.0 * weight
}

pub fn rating_boost(rating: f64, weight: f64) -> f64 {
    (rating / MAX_COLLEGE_RATING) * weight
}

/// Linear decay from 1 (brand new) to 0 (a year old or more). A course dated
/// ahead of `now` has a negative age and scores slightly above 1.
pub fn recency_factor(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_days = (now - created_at).num_milliseconds() as f64 / MILLIS_PER_DAY;
    (1.0 - age_days / RECENCY_WINDOW_DAYS).max(0.0)
}

/// Applies the additive boosts on top of a base similarity in `[0, 1]`.
///
/// Each term is independent; a term is skipped when its signal is absent or
/// zero, or when its weight is zero. The result is never negative.
pub fn apply_business_boosts(
    base_similarity: f64,
    signals: &BoostSignals,
    weights: &BoostWeights,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = base_similarity;

    if let Some(count) = signals.enrollment_count.filter(|&c| c > 0) {
        if weights.popularity != 0.0 {
            score += popularity_boost(count, weights.popularity);
        }
    }

    if let Some(rating) = signals.college_rating.filter(|r| *r != 0.0) {
        if weights.rating != 0.0 {
            score += rating_boost(rating, weights.rating);
        }
    }

    if let Some(created_at) = signals.created_at {
        if weights.recency != 0.0 {
            score += recency_factor(created_at, now) * weights.recency;
        }
    }

    if signals.eligible {
        score += weights.eligibility;
    }

    score.max(0.0)
}
