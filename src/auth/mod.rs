//! Authentication and authorization module

pub mod access;
pub mod catalog;
pub mod guard;
pub mod jwt;
pub mod middleware;

pub use access::{decide, role_has_permission, RoleGrants};
pub use guard::{permission_guard_middleware, PermissionGuard};
pub use jwt::{Claims, JwtService};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext};
