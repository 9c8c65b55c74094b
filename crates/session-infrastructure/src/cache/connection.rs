//! Redis connection pool

use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to create Redis pool: {0}")]
    Create(#[from] deadpool_redis::CreatePoolError),

    #[error("Redis not reachable: {0}")]
    Unreachable(#[from] deadpool_redis::PoolError),
}

/// Builds the pool and checks out one connection so a bad URL fails at
/// startup instead of on the first request.
pub async fn create_pool(url: &str, max_connections: u32) -> Result<Pool, PoolError> {
    let mut config = Config::from_url(url);
    config.pool = Some(PoolConfig::new(max_connections as usize));
    let pool = config.create_pool(Some(Runtime::Tokio1))?;

    let _conn = pool.get().await?;
    info!("Redis pool ready (max_connections={})", max_connections);
    Ok(pool)
}
