// Middleware for authentication, CORS, rate limiting

pub mod auth;
pub mod cors;
pub mod rate_limiter;

pub use auth::{OptionalSession, RequireSession};
pub use cors::cors_layer;
pub use rate_limiter::rate_limiter_middleware;
