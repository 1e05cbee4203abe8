//! Access tokens, password hashing and the request guards built on them.

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use extractor::CurrentUser;
pub use jwt::JwtKeys;
