//! Audit repository (审计数据访问)

use crate::{error::AppError, models::audit::*};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub struct AuditRepository {
    db: PgPool,
}

impl AuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 插入审计日志
    pub async fn insert_audit_log(&self, log: &AuditLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, subject_id, action, resource_type, resource_id,
                changes_summary, result, error_message, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id)
        .bind(log.subject_id)
        .bind(&log.action)
        .bind(&log.resource_type)
        .bind(log.resource_id)
        .bind(&log.changes_summary)
        .bind(&log.result)
        .bind(&log.error_message)
        .bind(log.occurred_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 查询审计日志
    pub async fn query_audit_logs(
        &self,
        filters: &AuditLogFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM audit_logs WHERE 1=1");

        if let Some(subject_id) = filters.subject_id {
            query.push(" AND subject_id = ").push_bind(subject_id);
        }
        if let Some(resource_type) = &filters.resource_type {
            query.push(" AND resource_type = ").push_bind(resource_type.clone());
        }
        if let Some(action) = &filters.action {
            query.push(" AND action = ").push_bind(action.clone());
        }

        query
            .push(" ORDER BY occurred_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let logs = query
            .build_query_as::<AuditLog>()
            .fetch_all(&self.db)
            .await?;

        Ok(logs)
    }
}
