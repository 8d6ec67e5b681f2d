// src/engine/ranking.rs

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::{
    boost::{BoostSignals, BoostWeights, apply_business_boosts},
    competency::CompetencyVector,
    similarity::cosine_similarity,
    to_percent,
};

/// A candidate that can be scored against a student's competency vector.
pub trait Rankable {
    fn competency_vector(&self) -> CompetencyVector;
    fn boost_signals(&self) -> BoostSignals;
}

/// A candidate after scoring. Both scores are 2-decimal percentages.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<T> {
    pub candidate: T,
    pub base_similarity: f64,
    pub final_score: f64,
    pub enrollment_count: i64,
}

/// Orders by final score, then base similarity, then enrollment, all descending.
pub fn compare_scored<T>(a: &ScoredCandidate<T>, b: &ScoredCandidate<T>) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| b.base_similarity.total_cmp(&a.base_similarity))
        .then_with(|| b.enrollment_count.cmp(&a.enrollment_count))
}

/// Scores one candidate. `eligible` is forced off until eligibility rules exist.
pub fn score_candidate<T: Rankable>(
    user: &CompetencyVector,
    candidate: T,
    weights: &BoostWeights,
    now: DateTime<Utc>,
) -> ScoredCandidate<T> {
    let base = cosine_similarity(user, &candidate.competency_vector());
    let signals = BoostSignals {
        eligible: false,
        ..candidate.boost_signals()
    };
    let boosted = apply_business_boosts(base, &signals, weights, now);

    ScoredCandidate {
        base_similarity: to_percent(base),
        final_score: to_percent(boosted),
        enrollment_count: signals.enrollment_count.unwrap_or(0),
        candidate,
    }
}

/// Scores every candidate, sorts best first and keeps the top `top_n`.
pub fn rank_candidates<T: Rankable>(
    user: &CompetencyVector,
    candidates: Vec<T>,
    weights: &BoostWeights,
    now: DateTime<Utc>,
    top_n: usize,
) -> Vec<ScoredCandidate<T>> {
    let mut scored: Vec<ScoredCandidate<T>> = candidates
        .into_iter()
        .map(|c| score_candidate(user, c, weights, now))
        .collect();

    scored.sort_by(compare_scored);
    scored.truncate(top_n);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone)]
    struct Stub {
        name: &'static str,
        profile: [f64; 6],
        enrollment: Option<i64>,
    }

    impl Rankable for Stub {
        fn competency_vector(&self) -> CompetencyVector {
            CompetencyVector::new(self.profile)
        }

        fn boost_signals(&self) -> BoostSignals {
            BoostSignals {
                enrollment_count: self.enrollment,
                eligible: true,
                ..Default::default()
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn names(ranked: &[ScoredCandidate<Stub>]) -> Vec<&'static str> {
        ranked.iter().map(|s| s.candidate.name).collect()
    }

    #[test]
    fn test_ranks_by_similarity_without_boosts() {
        let user = CompetencyVector::new([80.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let candidates = vec![
            Stub { name: "verbal", profile: [0.0, 1.0, 0.0, 0.0, 0.0, 0.0], enrollment: None },
            Stub { name: "exact", profile: [1.0, 0.0, 0.0, 0.0, 0.0, 0.0], enrollment: None },
            Stub { name: "mixed", profile: [1.0, 1.0, 0.0, 0.0, 0.0, 0.0], enrollment: None },
        ];
        let ranked = rank_candidates(&user, candidates, &BoostWeights::default(), now(), 10);
        assert_eq!(names(&ranked), ["exact", "mixed", "verbal"]);
        assert_eq!(ranked[0].base_similarity, 100.0);
        assert_eq!(ranked[0].final_score, 100.0);
    }

    #[test]
    fn test_eligibility_stub_is_never_applied() {
        let user = CompetencyVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let scored = score_candidate(
            &user,
            Stub { name: "a", profile: [1.0, 0.0, 0.0, 0.0, 0.0, 0.0], enrollment: None },
            &BoostWeights::default(),
            now(),
        );
        assert_eq!(scored.final_score, 100.0);
    }

    #[test]
    fn test_popularity_breaks_equal_similarity() {
        let user = CompetencyVector::new([1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let profile = [1.0, 0.2, 0.0, 0.0, 0.0, 0.0];
        let candidates = vec![
            Stub { name: "small", profile, enrollment: Some(10) },
            Stub { name: "large", profile, enrollment: Some(500) },
        ];
        let ranked = rank_candidates(&user, candidates, &BoostWeights::default(), now(), 10);
        assert_eq!(names(&ranked), ["large", "small"]);
        assert_eq!(ranked[0].base_similarity, ranked[1].base_similarity);
        assert!(ranked[0].final_score > ranked[1].final_score);
    }

    #[test]
    fn test_enrollment_tie_break_when_scores_equal() {
        let user = CompetencyVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let no_popularity = BoostWeights {
            popularity: 0.0,
            ..Default::default()
        };
        let profile = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let candidates = vec![
            Stub { name: "few", profile, enrollment: Some(3) },
            Stub { name: "many", profile, enrollment: Some(300) },
            Stub { name: "none", profile, enrollment: None },
        ];
        let ranked = rank_candidates(&user, candidates, &no_popularity, now(), 10);
        assert_eq!(names(&ranked), ["many", "few", "none"]);
    }

    #[test]
    fn test_zero_profile_ranks_last_but_is_kept() {
        let user = CompetencyVector::new([1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        let candidates = vec![
            Stub { name: "empty", profile: [0.0; 6], enrollment: None },
            Stub { name: "some", profile: [0.0, 0.0, 1.0, 0.0, 0.0, 0.0], enrollment: None },
        ];
        let ranked = rank_candidates(&user, candidates, &BoostWeights::default(), now(), 10);
        assert_eq!(names(&ranked), ["some", "empty"]);
        assert_eq!(ranked[1].base_similarity, 0.0);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let user = CompetencyVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let candidates: Vec<Stub> = (0..7)
            .map(|i| Stub {
                name: "c",
                profile: [1.0, i as f64, 0.0, 0.0, 0.0, 0.0],
                enrollment: None,
            })
            .collect();
        assert_eq!(rank_candidates(&user, candidates.clone(), &BoostWeights::default(), now(), 5).len(), 5);
        assert_eq!(rank_candidates(&user, candidates, &BoostWeights::default(), now(), 50).len(), 7);
    }
}
