//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`, capture errors and transactions)
//! 2. CORS
//! 3. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 4. Request ID (add unique ID to each request)
//! 5. Rate limiting on `/api/auth/*` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::RequireAuth;
pub use rate_limit::auth_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
