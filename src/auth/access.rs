//! 访问判定
//!
//! 纯函数，不做任何 I/O，可并发调用。
//! 只做精确匹配：授予 `zones:write` 不代表拥有 `zones:read`，系统角色也没有旁路。

use crate::error::AppError;
use std::collections::HashSet;
use uuid::Uuid;

/// 角色已授予的权限集合
#[derive(Debug, Clone)]
pub struct RoleGrants {
    pub role_id: Uuid,
    permissions: HashSet<(String, String)>,
}

impl RoleGrants {
    pub fn new<I, R, A>(role_id: Uuid, permissions: I) -> Self
    where
        I: IntoIterator<Item = (R, A)>,
        R: Into<String>,
        A: Into<String>,
    {
        Self {
            role_id,
            permissions: permissions
                .into_iter()
                .map(|(r, a)| (r.into(), a.into()))
                .collect(),
        }
    }
}

/// 角色是否拥有 (resource, action)
pub fn role_has_permission(role: &RoleGrants, resource: &str, action: &str) -> bool {
    role.permissions
        .contains(&(resource.to_string(), action.to_string()))
}

/// 判定主体能否执行 (resource, action)
///
/// - 没有主体 → Unauthorized
/// - 主体的角色无法解析 → NotFound
/// - 角色缺少权限 → Forbidden
pub fn decide(
    principal_id: Option<Uuid>,
    role: Option<&RoleGrants>,
    resource: &str,
    action: &str,
) -> Result<(), AppError> {
    let principal_id = principal_id.ok_or(AppError::Unauthorized)?;
    let role = role.ok_or_else(|| AppError::NotFound(format!("role of principal {}", principal_id)))?;

    if role_has_permission(role, resource, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
