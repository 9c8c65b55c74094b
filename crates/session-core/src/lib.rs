//! # Session Core
//!
//! Session lifecycle: identifier generation, store ports, and the
//! create/refresh/rotate state machine.

pub mod accessor;
pub mod clock;
pub mod domain;
pub mod error;
pub mod memory_store;
pub mod repositories;
pub mod services;
pub mod transport;

pub use accessor::SessionContext;
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use error::SessionError;
pub use memory_store::MemoryStore;
pub use repositories::{AttributeStore, RotationLease, SessionStore};
pub use services::{OsTokenGenerator, SessionAttributes, SessionConfig, SessionManager, TokenGenerator};
pub use transport::TokenTransport;
