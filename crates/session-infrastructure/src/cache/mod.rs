//! Redis-backed session storage

pub mod connection;
pub mod redis_store;

pub use connection::{create_pool, PoolError};
pub use redis_store::RedisSessionStore;
