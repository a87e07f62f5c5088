//! Role and permission domain models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 角色名：小写字母开头，可含数字、下划线、连字符
static ROLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]{1,49}$").expect("valid role name regex"));

/// 看板组件键
static WIDGET_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_.-]{0,63}$").expect("valid widget key regex"));

/// Role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Permission
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// 角色详情：角色本身 + 权限、菜单授权、看板组件
#[derive(Debug, Clone, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub menu_item_ids: Vec<Uuid>,
    pub dashboard_widgets: Vec<String>,
}

/// Create role request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(regex(path = *ROLE_NAME_RE, message = "invalid role name"))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
    #[serde(default)]
    pub dashboard_widgets: Vec<String>,
}

/// Update role request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// 权限整体替换
#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    pub permission_ids: Vec<Uuid>,
}

/// 看板组件整体替换
#[derive(Debug, Deserialize)]
pub struct SetWidgetsRequest {
    pub widgets: Vec<String>,
}

/// 校验看板组件键格式
pub fn validate_widget_keys(keys: &[String]) -> Result<(), crate::error::AppError> {
    match keys.iter().find(|k| !WIDGET_KEY_RE.is_match(k)) {
        Some(bad) => Err(crate::error::AppError::Validation(format!(
            "invalid widget key: {}",
            bad
        ))),
        None => Ok(()),
    }
}

/// Permission summary
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PermissionSummary {
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}
