//! # Session Infrastructure
//!
//! Store implementations (adapters) backed by Redis.

pub mod cache;

pub use cache::{create_pool, RedisSessionStore};
