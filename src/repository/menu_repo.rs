//! Menu repository (菜单目录与角色菜单授权)

use crate::{
    audit_context,
    error::AppError,
    models::menu::*,
    repository::role_repo::{dedup, lock_mutable_role, touch_role},
    services::menu_resolver::would_create_cycle,
};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

pub struct MenuRepository {
    db: PgPool,
}

impl MenuRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Catalog ====================

    /// 完整菜单目录
    pub async fn list_all(&self) -> Result<Vec<MenuItem>, AppError> {
        let items =
            sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items ORDER BY sort_order, id")
                .fetch_all(&self.db)
                .await?;

        Ok(items)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MenuItem>, AppError> {
        let item = sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(item)
    }

    /// 创建菜单项；父节点必须存在
    ///
    /// 系统角色不能通过接口修改菜单授权，新条目在同一事务内直接授予它们。
    pub async fn create(&self, req: &CreateMenuItemRequest) -> Result<MenuItem, AppError> {
        let mut tx = self.db.begin().await?;
        lock_catalog(&mut tx).await?;

        if let Some(parent_id) = req.parent_id {
            ensure_parent_exists(&mut tx, parent_id).await?;
        }

        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items
                (key, name, localized_name, icon, href, sort_order, is_active, parent_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(&req.key)
        .bind(&req.name)
        .bind(&req.localized_name)
        .bind(&req.icon)
        .bind(&req.href)
        .bind(req.sort_order)
        .bind(req.is_active)
        .bind(req.parent_id)
        .bind(audit_context::current_principal_id())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "menu_items_key_key", "Menu key already exists")
        })?;

        sqlx::query(
            r#"
            INSERT INTO role_menu_permissions (role_id, menu_item_id)
            SELECT id, $1 FROM roles WHERE is_system
            "#,
        )
        .bind(item.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item)
    }

    /// 更新菜单项；重新挂载时拒绝自引用、悬空父节点和环
    pub async fn update(&self, id: Uuid, req: &UpdateMenuItemRequest) -> Result<MenuItem, AppError> {
        let mut tx = self.db.begin().await?;
        lock_catalog(&mut tx).await?;

        let current = sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Menu item not found"))?;

        let parent_id = match req.parent_id {
            None => current.parent_id,
            Some(None) => None,
            Some(Some(parent_id)) => {
                if parent_id == id {
                    return Err(AppError::conflict("Menu item cannot be its own parent"));
                }
                ensure_parent_exists(&mut tx, parent_id).await?;

                let catalog = sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items")
                    .fetch_all(&mut *tx)
                    .await?;
                if would_create_cycle(&catalog, id, parent_id) {
                    return Err(AppError::conflict("Menu parent change would create a cycle"));
                }
                Some(parent_id)
            }
        };

        // 可空字段：缺省沿用当前值，显式 null 清空
        let localized_name = req
            .localized_name
            .clone()
            .unwrap_or_else(|| current.localized_name.clone());
        let icon = req.icon.clone().unwrap_or_else(|| current.icon.clone());
        let href = req.href.clone().unwrap_or_else(|| current.href.clone());

        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET
                name = COALESCE($2, name),
                localized_name = $3,
                icon = $4,
                href = $5,
                sort_order = COALESCE($6, sort_order),
                is_active = COALESCE($7, is_active),
                parent_id = $8,
                updated_by = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(localized_name)
        .bind(icon)
        .bind(href)
        .bind(req.sort_order)
        .bind(req.is_active)
        .bind(parent_id)
        .bind(audit_context::current_principal_id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item)
    }

    /// 删除菜单项；仍有子节点时拒绝，角色授权随之级联删除
    pub async fn delete(&self, id: Uuid) -> Result<MenuItem, AppError> {
        let mut tx = self.db.begin().await?;
        lock_catalog(&mut tx).await?;

        let item = sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Menu item not found"))?;

        let children: i64 = sqlx::query("SELECT COUNT(*) FROM menu_items WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .get(0);

        if children > 0 {
            return Err(AppError::Conflict(format!(
                "Menu item {} still has {} child item(s)",
                item.key, children
            )));
        }

        sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    // ==================== Role grants ====================

    /// 角色已授予的菜单 ID
    pub async fn get_role_menu_ids(&self, role_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT menu_item_id FROM role_menu_permissions WHERE role_id = $1 ORDER BY menu_item_id",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// 整体替换角色的菜单授权：同一事务内先删后插
    pub async fn replace_role_menus(
        &self,
        role_id: Uuid,
        menu_item_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError> {
        let ids = dedup(menu_item_ids);
        let mut tx = self.db.begin().await?;

        lock_mutable_role(&mut tx, role_id).await?;

        // 防止并发删除菜单项导致插入悬空授权
        let known: i64 = sqlx::query(
            "SELECT COUNT(*) FROM (SELECT id FROM menu_items WHERE id = ANY($1) FOR SHARE) m",
        )
        .bind(&ids)
        .fetch_one(&mut *tx)
        .await?
        .get(0);

        if known as usize != ids.len() {
            return Err(AppError::not_found("One or more menu items do not exist"));
        }

        sqlx::query("DELETE FROM role_menu_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO role_menu_permissions (role_id, menu_item_id)
            SELECT $1, UNNEST($2::uuid[])
            "#,
        )
        .bind(role_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        touch_role(&mut tx, role_id).await?;

        tx.commit().await?;

        tracing::info!(role_id = %role_id, count = ids.len(), "Role menus replaced");

        Ok(ids)
    }
}

/// 目录级事务锁，串行化结构性修改（创建、重新挂载、删除）
async fn lock_catalog(tx: &mut Transaction<'_, Postgres>) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('menu_items'))")
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn ensure_parent_exists(
    tx: &mut Transaction<'_, Postgres>,
    parent_id: Uuid,
) -> Result<(), AppError> {
    let exists: bool = sqlx::query("SELECT EXISTS(SELECT 1 FROM menu_items WHERE id = $1)")
        .bind(parent_id)
        .fetch_one(&mut **tx)
        .await?
        .get(0);

    if !exists {
        return Err(AppError::Conflict(format!(
            "Parent menu item {} does not exist",
            parent_id
        )));
    }

    Ok(())
}
