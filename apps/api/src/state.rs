use sqlx::PgPool;

use crate::auth::jwt::TokenService;
use crate::config::Config;
use crate::recommendations::RecommendationGateway;
use crate::scoring::aggregate::Aggregator;
use crate::uploads::LatestUploadStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub tokens: TokenService,
    /// Band thresholds come from config.
    pub aggregator: Aggregator,
    /// Wraps a pluggable `TextGenerator`; tests swap in a canned one.
    pub recommendations: RecommendationGateway,
    pub uploads: LatestUploadStore,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, recommendations: RecommendationGateway) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret, config.jwt_ttl_hours),
            aggregator: Aggregator::new(config.bands),
            uploads: LatestUploadStore::new(&config.upload_dir),
            db,
            config,
            recommendations,
        }
    }
}
