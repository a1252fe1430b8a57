use std::{convert::Infallible, sync::Arc};

use sqlx::{Pool, Sqlite};
use warp::Filter;

use crate::{config::Config, error::ApiError, jwt::SessionKey};

/// Everything a handler needs, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub keys: SessionKey,
}

impl AppState {
    pub fn new(pool: Pool<Sqlite>, config: Config) -> Result<Self, ApiError> {
        let keys = SessionKey::new(&config.secret_key, config.token_ttl_hours)?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            keys,
        })
    }
}

pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
