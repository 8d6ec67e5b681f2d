// src/state.rs

use crate::config::Config;
use crate::repository::postgres::{PgCandidateFetcher, PgSnapshotStore};
use crate::services::recommender::Recommender;
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl AppState {
    /// Recommender backed by this state's database.
    pub fn recommender(&self) -> Recommender<PgCandidateFetcher, PgSnapshotStore> {
        Recommender::new(
            PgCandidateFetcher::new(self.pool.clone()),
            PgSnapshotStore::new(self.pool.clone()),
            self.config.recommender,
        )
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
