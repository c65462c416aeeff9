pub mod auth;

pub use auth::{admin_only, editor_or_admin, protect, AuthUser};
