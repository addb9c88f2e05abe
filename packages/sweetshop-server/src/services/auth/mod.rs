#[allow(clippy::module_inception)]
pub mod auth;
pub mod user;

pub use auth::{AuthError, Identity, JwtKeys, require_admin, require_super_admin, require_user};
