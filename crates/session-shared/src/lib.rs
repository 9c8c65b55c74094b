//! # Session Shared
//!
//! Configuration, telemetry, and small utilities shared by the session crates.

pub mod constants;
pub mod utils;
pub mod telemetry;
pub mod config;
pub mod error;

pub use config::{AppConfig, SessionSettings};
pub use error::AppError;
