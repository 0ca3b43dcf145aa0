pub mod auth;
pub mod json_body;
pub mod rate_limit;

pub use auth::AuthUser;
pub use json_body::JsonBody;
pub use rate_limit::{IpRateLimiter, build_limiter, rate_limit};
