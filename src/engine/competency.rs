// src/engine/competency.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six aptitude dimensions used to describe both students and courses.
///
/// The declaration order is the canonical vector order. Every dense vector in
/// the system indexes its components by `Competency as usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competency {
    Analytical,
    Verbal,
    Creative,
    Scientific,
    Social,
    Technical,
}

impl Competency {
    pub const COUNT: usize = 6;

    pub const ALL: [Competency; Competency::COUNT] = [
        Competency::Analytical,
        Competency::Verbal,
        Competency::Creative,
        Competency::Scientific,
        Competency::Social,
        Competency::Technical,
    ];

    /// Key used in JSON payloads and stored documents.
    pub fn key(self) -> &'static str {
        match self {
            Competency::Analytical => "analytical",
            Competency::Verbal => "verbal",
            Competency::Creative => "creative",
            Competency::Scientific => "scientific",
            Competency::Social => "social",
            Competency::Technical => "technical",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Read-only lookup of a competency value by its key.
///
/// Anything that can answer "what is the value for `analytical`?" can be turned
/// into a [`CompetencyVector`]. `None` means absent or not a number.
pub trait CompetencySource {
    fn competency(&self, key: &str) -> Option<f64>;
}

impl<T: CompetencySource + ?Sized> CompetencySource for &T {
    fn competency(&self, key: &str) -> Option<f64> {
        (**self).competency(key)
    }
}

impl CompetencySource for HashMap<String, f64> {
    fn competency(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

impl CompetencySource for BTreeMap<String, f64> {
    fn competency(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

impl CompetencySource for serde_json::Map<String, Value> {
    fn competency(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(numeric_value)
    }
}

/// Only JSON objects carry competencies; any other shape reads as empty.
impl CompetencySource for Value {
    fn competency(&self, key: &str) -> Option<f64> {
        self.as_object().and_then(|map| map.competency(key))
    }
}

/// Numbers are taken as-is, numeric strings are parsed, everything else is absent.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Dense competency vector in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompetencyVector([f64; Competency::COUNT]);

impl CompetencyVector {
    pub const ZERO: CompetencyVector = CompetencyVector([0.0; Competency::COUNT]);

    pub fn new(values: [f64; Competency::COUNT]) -> Self {
        Self(values.map(finite_or_zero))
    }

    pub fn get(&self, competency: Competency) -> f64 {
        self.0[competency.index()]
    }

    pub fn as_array(&self) -> &[f64; Competency::COUNT] {
        &self.0
    }

    pub fn into_array(self) -> [f64; Competency::COUNT] {
        self.0
    }

    pub fn dot(&self, other: &CompetencyVector) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude() == 0.0
    }

    /// The `n` strongest dimensions, highest first. Ties keep canonical order.
    pub fn strongest(&self, n: usize) -> Vec<Competency> {
        let mut ranked = Competency::ALL;
        ranked.sort_by(|a, b| self.get(*b).total_cmp(&self.get(*a)));
        ranked.into_iter().take(n).collect()
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Converts any competency source into a dense vector.
///
/// Missing, non-numeric and non-finite entries become `0`. Keys outside the six
/// dimensions are ignored.
pub fn to_vector<S: CompetencySource + ?Sized>(source: &S) -> CompetencyVector {
    CompetencyVector::new(
        Competency::ALL.map(|c| source.competency(c.key()).unwrap_or(0.0)),
    )
}

/// Named competency record, as stored in JSON columns and returned by the API.
///
/// Absent fields deserialize as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetencyScores {
    pub analytical: f64,
    pub verbal: f64,
    pub creative: f64,
    pub scientific: f64,
    pub social: f64,
    pub technical: f64,
}

impl CompetencyScores {
    pub fn get(&self, competency: Competency) -> f64 {
        match competency {
            Competency::Analytical => self.analytical,
            Competency::Verbal => self.verbal,
            Competency::Creative => self.creative,
            Competency::Scientific => self.scientific,
            Competency::Social => self.social,
            Competency::Technical => self.technical,
        }
    }

    pub fn to_vector(&self) -> CompetencyVector {
        to_vector(self)
    }

    /// True when every dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.to_vector().is_zero()
    }
}

impl CompetencySource for CompetencyScores {
    fn competency(&self, key: &str) -> Option<f64> {
        Competency::ALL
            .iter()
            .find(|c| c.key() == key)
            .map(|c| self.get(*c))
    }
}

impl From<CompetencyVector> for CompetencyScores {
    fn from(vector: CompetencyVector) -> Self {
        Self {
            analytical: vector.get(Competency::Analytical),
            verbal: vector.get(Competency::Verbal),
            creative: vector.get(Competency::Creative),
            scientific: vector.get(Competency::Scientific),
            social: vector.get(Competency::Social),
            technical: vector.get(Competency::Technical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_order_matches_keys() {
        let keys: Vec<&str> = Competency::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            ["analytical", "verbal", "creative", "scientific", "social", "technical"]
        );
        for (i, c) in Competency::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_to_vector_from_json_fills_missing_with_zero() {
        let source = json!({ "analytical": 80, "technical": 40.5 });
        let v = to_vector(&source);
        assert_eq!(v.as_array(), &[80.0, 0.0, 0.0, 0.0, 0.0, 40.5]);
    }

    #[test]
    fn test_to_vector_coerces_non_numeric() {
        let source = json!({
            "analytical": "75",
            "verbal": "abc",
            "creative": null,
            "scientific": true,
            "social": [1, 2],
            "technical": 10
        });
        let v = to_vector(&source);
        assert_eq!(v.as_array(), &[75.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
    }

    #[test]
    fn test_to_vector_ignores_unknown_keys_and_non_objects() {
        let source = json!({ "musical": 99, "verbal": 3 });
        assert_eq!(to_vector(&source).as_array(), &[0.0, 3.0, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(to_vector(&json!([1, 2, 3])), CompetencyVector::ZERO);
        assert_eq!(to_vector(&Value::Null), CompetencyVector::ZERO);
    }

    #[test]
    fn test_to_vector_from_hash_map() {
        let mut map = HashMap::new();
        map.insert("social".to_string(), 12.0);
        map.insert("verbal".to_string(), f64::NAN);
        let v = to_vector(&map);
        assert_eq!(v.get(Competency::Social), 12.0);
        assert_eq!(v.get(Competency::Verbal), 0.0);
    }

    #[test]
    fn test_magnitude() {
        let v = CompetencyVector::new([3.0, 4.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(v.magnitude(), 5.0);
        assert_eq!(CompetencyVector::ZERO.magnitude(), 0.0);
        assert!(CompetencyVector::ZERO.is_zero());
    }

    #[test]
    fn test_scores_round_trip_through_vector() {
        let scores = CompetencyScores {
            analytical: 1.0,
            verbal: 2.0,
            creative: 3.0,
            scientific: 4.0,
            social: 5.0,
            technical: 6.0,
        };
        let v = scores.to_vector();
        assert_eq!(v.as_array(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(CompetencyScores::from(v), scores);
    }

    #[test]
    fn test_scores_deserialize_with_missing_fields() {
        let scores: CompetencyScores = serde_json::from_value(json!({ "creative": 7 })).unwrap();
        assert_eq!(scores.creative, 7.0);
        assert_eq!(scores.analytical, 0.0);
        assert!(!scores.is_empty());
        assert!(CompetencyScores::default().is_empty());
    }

    #[test]
    fn test_strongest_dimensions() {
        let v = CompetencyVector::new([0.2, 0.9, 0.2, 0.0, 0.5, 0.9]);
        assert_eq!(
            v.strongest(3),
            vec![Competency::Verbal, Competency::Technical, Competency::Social]
        );
        assert_eq!(
            CompetencyVector::ZERO.strongest(3),
            vec![Competency::Analytical, Competency::Verbal, Competency::Creative]
        );
        assert_eq!(v.strongest(10).len(), Competency::COUNT);
    }
}
