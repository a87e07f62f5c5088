//! Company repository (公司数据访问)

use crate::{
    audit_context,
    error::AppError,
    models::company::*,
    repository::default_flag::{clear_flag_in_tx, set_flag_in_tx, DefaultFlagRepository},
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct CompanyRepository {
    db: PgPool,
    flags: DefaultFlagRepository<Company>,
}

impl CompanyRepository {
    pub fn new(db: PgPool) -> Self {
        Self {
            flags: DefaultFlagRepository::new(db.clone()),
            db,
        }
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE is_active OR $1 ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(companies)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(company)
    }

    /// 创建公司；`is_primary = true` 时在同一事务内完成清除再设置
    pub async fn create(&self, req: &CreateCompanyRequest) -> Result<Company, AppError> {
        let actor = audit_context::current_principal_id();
        let mut tx = self.db.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, legal_name, tax_id, is_primary, is_active, created_by, updated_by)
            VALUES ($1, $2, $3, FALSE, TRUE, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.legal_name)
        .bind(&req.tax_id)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "companies_name_key", "Company name already exists")
        })?;

        let company = if req.is_primary {
            set_flag_in_tx::<Company>(&mut tx, company.id).await?
        } else {
            company
        };

        tx.commit().await?;

        Ok(company)
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateCompanyRequest,
    ) -> Result<Option<Company>, AppError> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET
                name = COALESCE($2, name),
                legal_name = COALESCE($3, legal_name),
                tax_id = COALESCE($4, tax_id),
                is_active = COALESCE($5, is_active),
                is_primary = CASE WHEN COALESCE($5, is_active) THEN is_primary ELSE FALSE END,
                updated_by = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.legal_name)
        .bind(&req.tax_id)
        .bind(req.is_active)
        .bind(audit_context::current_principal_id())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "companies_name_key", "Company name already exists")
        })?;

        let Some(company) = updated else {
            return Ok(None);
        };

        let company = match req.is_primary {
            Some(true) => set_flag_in_tx::<Company>(&mut tx, id).await?,
            Some(false) => clear_flag_in_tx::<Company>(&mut tx, id).await?.unwrap_or(company),
            None => company,
        };

        tx.commit().await?;

        Ok(Some(company))
    }

    /// 软删除公司
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET is_active = FALSE, is_primary = FALSE, updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(id)
        .bind(audit_context::current_principal_id())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 设为主公司
    pub async fn set_primary(&self, id: Uuid) -> Result<Company, AppError> {
        self.flags.set_default(id).await
    }

    /// 获取主公司
    pub async fn get_primary(&self) -> Result<Option<Company>, AppError> {
        self.flags.get_default().await
    }
}
