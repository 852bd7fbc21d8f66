use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::auth::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
        AppState {
            store,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }
}
