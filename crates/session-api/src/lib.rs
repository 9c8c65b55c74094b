//! # Session API
//!
//! axum adapter: cookie transport, session middleware, extractors, and
//! attribute handlers.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod transport;

pub use error::ApiError;
pub use extract::CurrentSession;
pub use middleware::session_middleware;
pub use routes::router;
pub use state::AppState;
pub use transport::CookieTransport;
