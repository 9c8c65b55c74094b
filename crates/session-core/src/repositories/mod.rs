//! Store traits (ports)

pub mod session_store;

pub use session_store::{AttributeStore, RotationLease, SessionStore};

#[cfg(test)]
pub use session_store::{MockRotationLease, MockSessionStore};
