// src/config.rs

use std::{env, str::FromStr};

use dotenvy::dotenv;

use crate::engine::boost::BoostWeights;

pub const DEFAULT_CANDIDATE_LIMIT: i64 = 2000;
pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_TOP_N: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub recommender: RecommenderSettings,
}

/// Tunables of the recommendation pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommenderSettings {
    /// Upper bound on candidates scored per request.
    pub candidate_limit: i64,
    pub default_top_n: usize,
    pub weights: BoostWeights,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            default_top_n: DEFAULT_TOP_N,
            weights: BoostWeights::default(),
        }
    }
}

impl RecommenderSettings {
    /// Requested list length, defaulted and capped.
    pub fn top_n(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_top_n).clamp(1, MAX_TOP_N)
    }
}

/// Reads an optional variable, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let defaults = BoostWeights::default();
        let recommender = RecommenderSettings {
            candidate_limit: env_or("RECOMMENDATION_CANDIDATE_LIMIT", DEFAULT_CANDIDATE_LIMIT).max(1),
            default_top_n: env_or("RECOMMENDATION_TOP_N", DEFAULT_TOP_N).clamp(1, MAX_TOP_N),
            weights: BoostWeights {
                popularity: env_or("BOOST_POPULARITY_WEIGHT", defaults.popularity),
                rating: env_or("BOOST_RATING_WEIGHT", defaults.rating),
                recency: env_or("BOOST_RECENCY_WEIGHT", defaults.recency),
                eligibility: env_or("BOOST_ELIGIBILITY_WEIGHT", defaults.eligibility),
            },
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: env_or("JWT_EXPIRATION", 86_400),
            rust_log,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            recommender,
        }
    }
}
