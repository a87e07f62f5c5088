//! Currency repository (币种数据访问)

use crate::{
    audit_context,
    error::AppError,
    models::currency::*,
    repository::default_flag::{clear_flag_in_tx, set_flag_in_tx, DefaultFlagRepository},
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct CurrencyRepository {
    db: PgPool,
    flags: DefaultFlagRepository<Currency>,
}

impl CurrencyRepository {
    pub fn new(db: PgPool) -> Self {
        Self {
            flags: DefaultFlagRepository::new(db.clone()),
            db,
        }
    }

    /// 列出币种
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Currency>, AppError> {
        let currencies = sqlx::query_as::<_, Currency>(
            "SELECT * FROM currencies WHERE is_active OR $1 ORDER BY code",
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(currencies)
    }

    /// 根据 ID 查找币种
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Currency>, AppError> {
        let currency = sqlx::query_as::<_, Currency>("SELECT * FROM currencies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(currency)
    }

    /// 创建币种；`is_default = true` 时在同一事务内完成清除再设置
    pub async fn create(&self, req: &CreateCurrencyRequest) -> Result<Currency, AppError> {
        let actor = audit_context::current_principal_id();
        let mut tx = self.db.begin().await?;

        let currency = sqlx::query_as::<_, Currency>(
            r#"
            INSERT INTO currencies (code, name, symbol, is_default, is_active, created_by, updated_by)
            VALUES ($1, $2, $3, FALSE, TRUE, $4, $4)
            RETURNING *
            "#,
        )
        .bind(req.code.to_uppercase())
        .bind(&req.name)
        .bind(&req.symbol)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "currencies_code_key", "Currency code already exists")
        })?;

        let currency = if req.is_default {
            set_flag_in_tx::<Currency>(&mut tx, currency.id).await?
        } else {
            currency
        };

        tx.commit().await?;

        Ok(currency)
    }

    /// 更新币种
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateCurrencyRequest,
    ) -> Result<Option<Currency>, AppError> {
        let mut tx = self.db.begin().await?;

        // 停用时同时清除默认标记
        let updated = sqlx::query_as::<_, Currency>(
            r#"
            UPDATE currencies
            SET
                name = COALESCE($2, name),
                symbol = COALESCE($3, symbol),
                is_active = COALESCE($4, is_active),
                is_default = CASE WHEN COALESCE($4, is_active) THEN is_default ELSE FALSE END,
                updated_by = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.symbol)
        .bind(req.is_active)
        .bind(audit_context::current_principal_id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(currency) = updated else {
            return Ok(None);
        };

        let currency = match req.is_default {
            Some(true) => set_flag_in_tx::<Currency>(&mut tx, id).await?,
            Some(false) => clear_flag_in_tx::<Currency>(&mut tx, id).await?.unwrap_or(currency),
            None => currency,
        };

        tx.commit().await?;

        Ok(Some(currency))
    }

    /// 软删除币种（停用并清除默认标记）
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE currencies
            SET is_active = FALSE, is_default = FALSE, updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(id)
        .bind(audit_context::current_principal_id())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 设为默认币种
    pub async fn set_default(&self, id: Uuid) -> Result<Currency, AppError> {
        self.flags.set_default(id).await
    }

    /// 获取默认币种
    pub async fn get_default(&self) -> Result<Option<Currency>, AppError> {
        self.flags.get_default().await
    }
}
