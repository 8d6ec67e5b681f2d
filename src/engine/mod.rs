// src/engine/mod.rs

//! Pure scoring core: competency vectors, similarity, business boosts,
//! candidate ranking and test-attempt aggregation.
//!
//! Nothing in here touches the database or the clock; callers pass in the
//! data and the current time.

pub mod aggregate;
pub mod boost;
pub mod competency;
pub mod ranking;
pub mod similarity;

/// Rounds to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Expresses a 0..1 fraction as a percentage with 2 decimal places.
pub fn to_percent(fraction: f64) -> f64 {
    (fraction * 10000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(50.0), 50.0);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
    }

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.75), 75.0);
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(0.0), 0.0);
    }
}
