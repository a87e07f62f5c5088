//! 权限目录
//! 系统中所有受保护的 (resource, action) 能力对

use once_cell::sync::Lazy;

/// 资源名称
pub mod resource {
    pub const ROLES: &str = "roles";
    pub const PERMISSIONS: &str = "permissions";
    pub const MENUS: &str = "menus";
    pub const USERS: &str = "users";
    pub const CURRENCIES: &str = "currencies";
    pub const COMPANIES: &str = "companies";
    pub const AUDIT: &str = "audit";

    // 业务资源（由各自的 CRUD 模块使用）
    pub const ZONES: &str = "zones";
    pub const BUILDINGS: &str = "buildings";
    pub const EMPLOYEES: &str = "employees";
    pub const INVOICES: &str = "invoices";
    pub const QUOTES: &str = "quotes";
    pub const CONTRACTS: &str = "contracts";
}

/// 操作名称
pub mod action {
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
    pub const DELETE: &str = "delete";
}

/// 目录条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub resource: &'static str,
    pub action: &'static str,
    pub description: String,
}

const RESOURCES: &[&str] = &[
    resource::ROLES,
    resource::PERMISSIONS,
    resource::MENUS,
    resource::USERS,
    resource::CURRENCIES,
    resource::COMPANIES,
    resource::AUDIT,
    resource::ZONES,
    resource::BUILDINGS,
    resource::EMPLOYEES,
    resource::INVOICES,
    resource::QUOTES,
    resource::CONTRACTS,
];

const ACTIONS: &[&str] = &[action::READ, action::WRITE, action::DELETE];

/// 完整权限目录
pub static PERMISSION_CATALOG: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    RESOURCES
        .iter()
        .flat_map(|&resource| {
            ACTIONS.iter().map(move |&action| CatalogEntry {
                resource,
                action,
                description: format!("{} {}", capitalize(action), resource),
            })
        })
        .collect()
});

/// 判断 (resource, action) 是否在目录中
pub fn is_known(resource: &str, action: &str) -> bool {
    PERMISSION_CATALOG
        .iter()
        .any(|entry| entry.resource == resource && entry.action == action)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
