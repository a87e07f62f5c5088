//! Business logic services layer

pub mod audit_service;
pub mod menu_resolver;
pub mod menu_service;
pub mod permission_service;

pub use audit_service::{AuditAction, AuditService};
pub use menu_service::MenuService;
pub use permission_service::PermissionService;
