//! Property-based tests for the scoring engine.
//!
//! - Similarity of non-negative vectors stays within [0, 1]
//! - A zero vector on either side scores 0
//! - A non-zero vector is 100% similar to itself
//! - Boosts never decrease as enrollment, rating or recency grow
//! - Ranked output is ordered and never longer than requested

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use guidance_backend::engine::{
    boost::{BoostSignals, BoostWeights, apply_business_boosts},
    competency::CompetencyVector,
    ranking::{Rankable, compare_scored, rank_candidates},
    similarity::{cosine_similarity, similarity_percent},
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_unit() -> impl Strategy<Value = f64> {
    (0u32..=1000u32).prop_map(|v| v as f64 / 1000.0)
}

fn arb_vector() -> impl Strategy<Value = CompetencyVector> {
    proptest::array::uniform6(arb_unit()).prop_map(CompetencyVector::new)
}

fn arb_non_zero_vector() -> impl Strategy<Value = CompetencyVector> {
    arb_vector().prop_filter("non-zero", |v| !v.is_zero())
}

#[derive(Debug, Clone)]
struct Offer {
    profile: CompetencyVector,
    enrollment: Option<i64>,
    rating: Option<f64>,
}

impl Rankable for Offer {
    fn competency_vector(&self) -> CompetencyVector {
        self.profile
    }

    fn boost_signals(&self) -> BoostSignals {
        BoostSignals {
            enrollment_count: self.enrollment,
            college_rating: self.rating,
            ..Default::default()
        }
    }
}

fn arb_offer() -> impl Strategy<Value = Offer> {
    (
        arb_vector(),
        proptest::option::of(0i64..100_000),
        proptest::option::of((0u32..=50u32).prop_map(|r| r as f64 / 10.0)),
    )
        .prop_map(|(profile, enrollment, rating)| Offer {
            profile,
            enrollment,
            rating,
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn similarity_is_bounded(a in arb_vector(), b in arb_vector()) {
        let s = cosine_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&s), "similarity {} out of range", s);
    }

    #[test]
    fn zero_vector_scores_zero(a in arb_vector()) {
        prop_assert_eq!(cosine_similarity(&CompetencyVector::ZERO, &a), 0.0);
        prop_assert_eq!(cosine_similarity(&a, &CompetencyVector::ZERO), 0.0);
    }

    #[test]
    fn self_similarity_is_one_hundred(a in arb_non_zero_vector()) {
        prop_assert_eq!(similarity_percent(&a, &a), 100.0);
    }

    #[test]
    fn similarity_is_symmetric(a in arb_vector(), b in arb_vector()) {
        prop_assert_eq!(similarity_percent(&a, &b), similarity_percent(&b, &a));
    }

    #[test]
    fn boost_monotone_in_enrollment(base in arb_unit(), low in 0i64..1_000_000, extra in 0i64..1_000_000) {
        let weights = BoostWeights::default();
        let now = Utc::now();
        let signals = |n: i64| BoostSignals { enrollment_count: Some(n), ..Default::default() };
        let a = apply_business_boosts(base, &signals(low), &weights, now);
        let b = apply_business_boosts(base, &signals(low + extra), &weights, now);
        prop_assert!(a <= b);
    }

    #[test]
    fn boost_monotone_in_rating(base in arb_unit(), low in 0u32..=50, extra in 0u32..=50) {
        let weights = BoostWeights::default();
        let now = Utc::now();
        let high = (low + extra).min(50);
        let signals = |r: u32| BoostSignals { college_rating: Some(r as f64 / 10.0), ..Default::default() };
        let a = apply_business_boosts(base, &signals(low), &weights, now);
        let b = apply_business_boosts(base, &signals(high), &weights, now);
        prop_assert!(a <= b);
    }

    #[test]
    fn boost_monotone_in_recency(base in arb_unit(), older in 0i64..800, newer_by in 0i64..800) {
        let weights = BoostWeights::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let created = |age: i64| BoostSignals { created_at: Some(now - Duration::days(age)), ..Default::default() };
        let old = apply_business_boosts(base, &created(older + newer_by), &weights, now);
        let new = apply_business_boosts(base, &created(older), &weights, now);
        prop_assert!(old <= new);
    }

    #[test]
    fn boosts_never_lower_the_base(base in arb_unit(), offer in arb_offer()) {
        let boosted = apply_business_boosts(base, &offer.boost_signals(), &BoostWeights::default(), Utc::now());
        prop_assert!(boosted >= base);
    }

    #[test]
    fn ranking_is_ordered_and_truncated(
        user in arb_vector(),
        offers in proptest::collection::vec(arb_offer(), 0..30),
        top_n in 1usize..15,
    ) {
        let count = offers.len();
        let ranked = rank_candidates(&user, offers, &BoostWeights::default(), Utc::now(), top_n);

        prop_assert_eq!(ranked.len(), top_n.min(count));
        for pair in ranked.windows(2) {
            prop_assert_ne!(compare_scored(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
        }
    }
}
