//! 主体（用户）模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 已认证的操作主体
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建主体记录（凭证由外部认证服务管理）
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    pub display_name: Option<String>,
    pub role_id: Option<Uuid>,
}

/// 设置或清除主体的角色
#[derive(Debug, Deserialize)]
pub struct AssignUserRoleRequest {
    pub role_id: Option<Uuid>,
}
