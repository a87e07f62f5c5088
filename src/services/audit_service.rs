//! 审计日志服务
//! 主体取自当前审计上下文，系统写入时为空

use crate::{
    audit_context, error::AppError, models::audit::*, repository::audit_repo::AuditRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

/// 审计操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    // 角色与权限
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    RolePermissionsAssign,
    RoleMenusAssign,
    RoleWidgetsAssign,
    UserCreate,
    UserRoleAssign,

    // 菜单目录
    MenuItemCreate,
    MenuItemUpdate,
    MenuItemDelete,

    // 默认标记实体
    CurrencyCreate,
    CurrencyUpdate,
    CurrencyDelete,
    CurrencySetDefault,
    CompanyCreate,
    CompanyUpdate,
    CompanyDelete,
    CompanySetPrimary,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RoleCreate => "role.create",
            AuditAction::RoleUpdate => "role.update",
            AuditAction::RoleDelete => "role.delete",
            AuditAction::RolePermissionsAssign => "role.permissions_assign",
            AuditAction::RoleMenusAssign => "role.menus_assign",
            AuditAction::RoleWidgetsAssign => "role.widgets_assign",
            AuditAction::UserCreate => "user.create",
            AuditAction::UserRoleAssign => "user.role_assign",

            AuditAction::MenuItemCreate => "menu_item.create",
            AuditAction::MenuItemUpdate => "menu_item.update",
            AuditAction::MenuItemDelete => "menu_item.delete",

            AuditAction::CurrencyCreate => "currency.create",
            AuditAction::CurrencyUpdate => "currency.update",
            AuditAction::CurrencyDelete => "currency.delete",
            AuditAction::CurrencySetDefault => "currency.set_default",
            AuditAction::CompanyCreate => "company.create",
            AuditAction::CompanyUpdate => "company.update",
            AuditAction::CompanyDelete => "company.delete",
            AuditAction::CompanySetPrimary => "company.set_primary",
        }
    }

    /// 操作对应的资源类型
    pub fn resource_type(&self) -> &'static str {
        self.as_str()
            .split('.')
            .next()
            .unwrap_or("unknown")
    }
}

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 记录一次成功的管理操作
    pub async fn log_action(
        &self,
        action: AuditAction,
        resource_id: Option<Uuid>,
        changes_summary: Option<&str>,
    ) -> Result<(), AppError> {
        let log = AuditLog {
            id: Uuid::new_v4(),
            subject_id: audit_context::current_principal_id(),
            action: action.as_str().to_string(),
            resource_type: action.resource_type().to_string(),
            resource_id,
            changes_summary: changes_summary.map(|s| s.to_string()),
            result: "success".to_string(),
            error_message: None,
            occurred_at: chrono::Utc::now(),
        };

        let repo = AuditRepository::new(self.db.clone());
        repo.insert_audit_log(&log).await?;

        Ok(())
    }

    /// 查询审计日志
    pub async fn query_logs(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError> {
        let limit = filters.limit.unwrap_or(50).clamp(1, 500);
        let offset = filters.offset.unwrap_or(0).max(0);

        let repo = AuditRepository::new(self.db.clone());
        repo.query_audit_logs(filters, limit, offset).await
    }
}
