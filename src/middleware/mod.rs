//! Request-processing layers and extractors: token authentication, client IP resolution,
//! rate limiting and security headers.

pub mod auth;
pub mod ip;
pub mod rate_limit;
pub mod security_headers;

pub use auth::{AuthUser, StaffUser};
pub use ip::ClientIp;
pub use rate_limit::{EndpointRateLimiter, RateLimiter};
