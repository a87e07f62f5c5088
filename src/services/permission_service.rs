//! 权限检查服务

use crate::{
    auth::access::{self, RoleGrants},
    error::AppError,
    models::role::PermissionSummary,
    repository::{role_repo::RoleRepository, user_repo::UserRepository},
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PermissionService {
    db: PgPool,
}

impl PermissionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 解析主体的角色权限集合
    ///
    /// 主体不存在、没有角色或角色不存在时返回 None。
    pub async fn resolve_grants(&self, principal_id: Uuid) -> Result<Option<RoleGrants>, AppError> {
        let user_repo = UserRepository::new(self.db.clone());
        let Some(role_id) = user_repo
            .find_by_id(principal_id)
            .await?
            .and_then(|user| user.role_id)
        else {
            return Ok(None);
        };

        RoleRepository::new(self.db.clone()).load_grants(role_id).await
    }

    /// 访问守卫：在任何处理器执行前调用
    pub async fn authorize(
        &self,
        principal_id: Option<Uuid>,
        resource: &str,
        action: &str,
    ) -> Result<(), AppError> {
        // 没有主体时直接拒绝，不访问数据库
        let Some(id) = principal_id else {
            return access::decide(None, None, resource, action);
        };

        let grants = self.resolve_grants(id).await?;
        let decision = access::decide(Some(id), grants.as_ref(), resource, action);

        if let Err(err) = &decision {
            tracing::warn!(
                principal_id = %id,
                role_id = ?grants.as_ref().map(|g| g.role_id),
                resource = %resource,
                action = %action,
                reason = %err,
                "Permission denied"
            );
            metrics::counter!(
                "access_denied_total",
                "resource" => resource.to_string(),
                "action" => action.to_string()
            )
            .increment(1);
        }

        decision
    }

    /// 获取主体的所有权限摘要
    pub async fn get_user_permissions(
        &self,
        principal_id: Uuid,
    ) -> Result<Vec<PermissionSummary>, AppError> {
        let user_repo = UserRepository::new(self.db.clone());
        let user = user_repo
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let Some(role_id) = user.role_id else {
            return Ok(Vec::new());
        };

        let role_repo = RoleRepository::new(self.db.clone());
        let permissions = role_repo
            .get_role_permissions(role_id)
            .await?
            .into_iter()
            .map(|p| PermissionSummary {
                resource: p.resource,
                action: p.action,
                description: p.description,
            })
            .collect();

        Ok(permissions)
    }
}
