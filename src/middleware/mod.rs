pub mod auth;
pub mod client;
pub mod permissions;
pub mod rate_limit;
pub mod security_headers;

pub use auth::require_auth;
pub use auth::AuthenticatedPrincipal;
pub use client::client_ip;
pub use permissions::*;
pub use rate_limit::{login_rate_limit, LoginRateLimiter};
pub use security_headers::security_headers;
