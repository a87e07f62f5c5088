//! Role repository (角色数据访问)

use crate::{
    audit_context,
    auth::access::RoleGrants,
    error::AppError,
    models::role::*,
};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::BTreeSet;
use uuid::Uuid;

pub struct RoleRepository {
    db: PgPool,
}

impl RoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Roles ====================

    /// 列出所有角色
    pub async fn list(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        Ok(roles)
    }

    /// 根据 ID 查找角色
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    /// 角色详情
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<RoleDetail>, AppError> {
        let Some(role) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let permissions = self.get_role_permissions(id).await?;
        let menu_item_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT menu_item_id FROM role_menu_permissions WHERE role_id = $1 ORDER BY menu_item_id",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;
        let dashboard_widgets = self.get_dashboard_widgets(id).await?;

        Ok(Some(RoleDetail {
            role,
            permissions,
            menu_item_ids,
            dashboard_widgets,
        }))
    }

    /// 创建角色（非系统角色）
    pub async fn create(&self, req: &CreateRoleRequest) -> Result<Role, AppError> {
        let actor = audit_context::current_principal_id();
        let mut tx = self.db.begin().await?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, display_name, description, is_system, created_by, updated_by)
            VALUES ($1, $2, $3, FALSE, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.display_name)
        .bind(&req.description)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "roles_name_key", "Role name already exists")
        })?;

        if !req.permission_ids.is_empty() {
            insert_permissions(&mut tx, role.id, &dedup(&req.permission_ids)).await?;
        }
        insert_widgets(&mut tx, role.id, &req.dashboard_widgets).await?;

        tx.commit().await?;

        Ok(role)
    }

    /// 更新角色
    pub async fn update(&self, id: Uuid, req: &UpdateRoleRequest) -> Result<Role, AppError> {
        let mut tx = self.db.begin().await?;

        lock_mutable_role(&mut tx, id).await?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET
                display_name = COALESCE($2, display_name),
                description = COALESCE($3, description),
                updated_by = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.display_name)
        .bind(&req.description)
        .bind(audit_context::current_principal_id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(role)
    }

    /// 删除角色
    ///
    /// 系统角色或仍有主体关联的角色不可删除；检查与删除在同一事务中完成。
    pub async fn delete(&self, id: Uuid) -> Result<Role, AppError> {
        let mut tx = self.db.begin().await?;

        let role = lock_mutable_role(&mut tx, id).await?;

        let attached: i64 = sqlx::query("SELECT COUNT(*) FROM users WHERE role_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .get(0);

        if attached > 0 {
            return Err(AppError::Conflict(format!(
                "Role {} is still assigned to {} user(s)",
                role.name, attached
            )));
        }

        // role_permissions / role_menu_permissions / role_dashboard_widgets 级联删除
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(role)
    }

    // ==================== Permissions ====================

    /// 获取角色的所有权限
    pub async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.*
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.resource, p.action
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }

    /// 列出所有权限
    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions =
            sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY resource, action")
                .fetch_all(&self.db)
                .await?;

        Ok(permissions)
    }

    /// 加载角色的权限集合，用于访问判定
    pub async fn load_grants(&self, role_id: Uuid) -> Result<Option<RoleGrants>, AppError> {
        let Some(role) = self.find_by_id(role_id).await? else {
            return Ok(None);
        };

        let permissions = self.get_role_permissions(role_id).await?;

        Ok(Some(RoleGrants::new(
            role.id,
            permissions.into_iter().map(|p| (p.resource, p.action)),
        )))
    }

    /// 整体替换角色的权限
    pub async fn replace_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, AppError> {
        let ids = dedup(permission_ids);
        let mut tx = self.db.begin().await?;

        lock_mutable_role(&mut tx, role_id).await?;

        let known: i64 = sqlx::query("SELECT COUNT(*) FROM permissions WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_one(&mut *tx)
            .await?
            .get(0);

        if known as usize != ids.len() {
            return Err(AppError::not_found("One or more permissions do not exist"));
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        insert_permissions(&mut tx, role_id, &ids).await?;
        touch_role(&mut tx, role_id).await?;

        tx.commit().await?;

        self.get_role_permissions(role_id).await
    }

    // ==================== Dashboard widgets ====================

    /// 获取角色的看板组件
    pub async fn get_dashboard_widgets(&self, role_id: Uuid) -> Result<Vec<String>, AppError> {
        let widgets = sqlx::query_scalar::<_, String>(
            "SELECT widget_key FROM role_dashboard_widgets WHERE role_id = $1 ORDER BY widget_key",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(widgets)
    }

    /// 整体替换角色的看板组件
    pub async fn replace_dashboard_widgets(
        &self,
        role_id: Uuid,
        widgets: &[String],
    ) -> Result<Vec<String>, AppError> {
        let mut tx = self.db.begin().await?;

        lock_mutable_role(&mut tx, role_id).await?;

        sqlx::query("DELETE FROM role_dashboard_widgets WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        insert_widgets(&mut tx, role_id, widgets).await?;
        touch_role(&mut tx, role_id).await?;

        tx.commit().await?;

        self.get_dashboard_widgets(role_id).await
    }
}

/// 锁定角色行；不存在返回 NotFound，系统角色返回 Conflict
pub(crate) async fn lock_mutable_role(
    tx: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
) -> Result<Role, AppError> {
    let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 FOR UPDATE")
        .bind(role_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;

    if role.is_system {
        return Err(AppError::Conflict(format!(
            "System role {} cannot be modified",
            role.name
        )));
    }

    Ok(role)
}

/// 记录角色最后修改人
pub(crate) async fn touch_role(
    tx: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query("UPDATE roles SET updated_by = $2, updated_at = NOW() WHERE id = $1")
        .bind(role_id)
        .bind(audit_context::current_principal_id())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn insert_permissions(
    tx: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
    permission_ids: &[Uuid],
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, UNNEST($2::uuid[])
        "#,
    )
    .bind(role_id)
    .bind(permission_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| match &e {
        // 外键失败说明权限 ID 不存在
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            AppError::not_found("One or more permissions do not exist")
        }
        _ => AppError::Database(e),
    })?;

    Ok(())
}

async fn insert_widgets(
    tx: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
    widgets: &[String],
) -> Result<(), AppError> {
    let keys: Vec<String> = widgets
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if keys.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO role_dashboard_widgets (role_id, widget_key)
        SELECT $1, UNNEST($2::text[])
        "#,
    )
    .bind(role_id)
    .bind(&keys)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// 去重并保持确定顺序
pub(crate) fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}
