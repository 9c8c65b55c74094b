//! Session services

pub mod session_attributes;
pub mod session_manager;
pub mod token_generator;

pub use session_attributes::SessionAttributes;
pub use session_manager::{SessionConfig, SessionManager};
pub use token_generator::{OsTokenGenerator, TokenGenerator};

#[cfg(test)]
pub use token_generator::MockTokenGenerator;
