//! Domain types

pub mod session;

pub use session::{SessionId, SessionResolution, CREATED_AT_FIELD, SESSION_ID_BYTES, SESSION_ID_HEX_LEN};
