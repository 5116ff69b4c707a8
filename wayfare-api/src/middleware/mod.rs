pub mod auth;

pub use auth::{require_admin, staff_auth_middleware, StaffClaims, ROLE_ADMIN, ROLE_AGENT};
