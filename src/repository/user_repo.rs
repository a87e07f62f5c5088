//! User repository (主体数据访问)

use crate::{audit_context, error::AppError, models::user::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据 ID 查找主体
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 创建主体记录
    pub async fn create(&self, req: &CreateUserRequest) -> Result<User, AppError> {
        let mut tx = self.db.begin().await?;

        if let Some(role_id) = req.role_id {
            lock_role_shared(&mut tx, role_id).await?;
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, display_name, role_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&req.username)
        .bind(&req.display_name)
        .bind(req.role_id)
        .bind(audit_context::current_principal_id())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "users_username_key", "Username already exists")
        })?;

        tx.commit().await?;

        Ok(user)
    }

    /// 设置或清除主体的角色
    pub async fn assign_role(&self, user_id: Uuid, role_id: Option<Uuid>) -> Result<User, AppError> {
        let mut tx = self.db.begin().await?;

        // 与角色删除互斥：删除持有 FOR UPDATE，这里持有 FOR SHARE
        if let Some(role_id) = role_id {
            lock_role_shared(&mut tx, role_id).await?;
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role_id = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(audit_context::current_principal_id())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

        tx.commit().await?;

        Ok(user)
    }
}

async fn lock_role_shared(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    role_id: Uuid,
) -> Result<(), AppError> {
    let found = sqlx::query("SELECT id FROM roles WHERE id = $1 FOR SHARE")
        .bind(role_id)
        .fetch_optional(&mut **tx)
        .await?;

    if found.is_none() {
        return Err(AppError::not_found("Role not found"));
    }

    Ok(())
}
