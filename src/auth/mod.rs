//! Session tokens, password hashing and the auth guards.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtKeys};
pub use middleware::{bearer_token, require_admin, require_user};
pub use password::{hash_password, verify_password};
