//! 默认 / 主记录标记
//!
//! 同一实体族（整张表）内最多一条记录带标记。
//! 所有标记变更走 `set_flag_in_tx`：先取族级事务锁，再清除其他记录、设置目标，
//! 整个过程在同一事务内完成。表上的部分唯一索引作为存储层兜底。

use crate::{audit_context, error::AppError};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, Transaction};
use std::marker::PhantomData;
use uuid::Uuid;

/// 带默认 / 主标记的实体族
pub trait DefaultFlagged: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// 表名
    const TABLE: &'static str;
    /// 标记列名
    const FLAG_COLUMN: &'static str;
    /// 日志与错误消息中的实体名
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn is_active(&self) -> bool;
    fn is_flagged(&self) -> bool;
}

/// 从记录集中选出默认记录
///
/// 有显式标记时返回该记录；否则返回名称按字节序最小的启用记录（同名按 id）。
pub fn pick_default<T: DefaultFlagged>(records: Vec<T>) -> Option<T> {
    let mut fallback: Option<T> = None;

    for record in records {
        if record.is_flagged() {
            return Some(record);
        }
        if !record.is_active() {
            continue;
        }
        let smaller = fallback.as_ref().map_or(true, |best| {
            (record.name(), record.id()) < (best.name(), best.id())
        });
        if smaller {
            fallback = Some(record);
        }
    }

    fallback
}

/// 取实体族的事务级咨询锁，串行化同族的标记写入
pub async fn lock_family<T: DefaultFlagged>(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(T::TABLE)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// 在事务内清除其他记录的标记并设置目标
pub async fn set_flag_in_tx<T: DefaultFlagged>(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<T, AppError> {
    lock_family::<T>(tx).await?;

    let target = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = $1", T::TABLE))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", T::ENTITY, id)))?;

    if !target.is_active() {
        return Err(AppError::Conflict(format!(
            "Inactive {} cannot be marked as default",
            T::ENTITY
        )));
    }

    let actor = audit_context::current_principal_id();

    sqlx::query(&format!(
        "UPDATE {table} SET {flag} = FALSE, updated_by = $2, updated_at = NOW() \
         WHERE {flag} AND id <> $1",
        table = T::TABLE,
        flag = T::FLAG_COLUMN,
    ))
    .bind(id)
    .bind(actor)
    .execute(&mut **tx)
    .await?;

    let record = sqlx::query_as::<_, T>(&format!(
        "UPDATE {table} SET {flag} = TRUE, updated_by = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
        table = T::TABLE,
        flag = T::FLAG_COLUMN,
    ))
    .bind(id)
    .bind(actor)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

/// 在事务内清除单条记录的标记
pub async fn clear_flag_in_tx<T: DefaultFlagged>(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<T>, AppError> {
    let record = sqlx::query_as::<_, T>(&format!(
        "UPDATE {table} SET {flag} = FALSE, updated_by = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
        table = T::TABLE,
        flag = T::FLAG_COLUMN,
    ))
    .bind(id)
    .bind(audit_context::current_principal_id())
    .fetch_optional(&mut **tx)
    .await?;

    Ok(record)
}

/// 通用默认标记仓储
pub struct DefaultFlagRepository<T> {
    db: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DefaultFlagged> DefaultFlagRepository<T> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// 把目标设为默认，原子地清除其他记录的标记
    pub async fn set_default(&self, id: Uuid) -> Result<T, AppError> {
        let mut tx = self.db.begin().await?;
        let record = set_flag_in_tx::<T>(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(entity = T::ENTITY, id = %id, "Default record changed");

        Ok(record)
    }

    /// 获取默认记录
    ///
    /// 没有显式标记时按名称回退，返回 None 仅表示没有任何启用记录。
    pub async fn get_default(&self) -> Result<Option<T>, AppError> {
        let candidates = sqlx::query_as::<_, T>(&format!(
            "SELECT * FROM {table} WHERE {flag} OR is_active",
            table = T::TABLE,
            flag = T::FLAG_COLUMN,
        ))
        .fetch_all(&self.db)
        .await?;

        let picked = pick_default(candidates);

        if picked.as_ref().is_some_and(|r| !r.is_flagged()) {
            tracing::debug!(entity = T::ENTITY, "No explicit default, using name fallback");
        }

        Ok(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::currency::Currency;
    use chrono::Utc;

    fn currency(name: &str, is_default: bool, is_active: bool) -> Currency {
        Currency {
            id: Uuid::new_v4(),
            code: name[..3.min(name.len())].to_uppercase(),
            name: name.to_string(),
            symbol: None,
            is_default,
            is_active,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_explicit_flag_wins_over_name_order() {
        let records = vec![
            currency("Australian Dollar", false, true),
            currency("Zloty", true, true),
        ];
        assert_eq!(pick_default(records).unwrap().name, "Zloty");
    }

    #[test]
    fn test_fallback_smallest_active_name() {
        let records = vec![
            currency("Euro", false, true),
            currency("Dinar", false, false),
            currency("Peso", false, true),
        ];
        assert_eq!(pick_default(records).unwrap().name, "Euro");
    }

    #[test]
    fn test_fallback_is_bytewise() {
        // 大写字母排在小写之前
        let records = vec![currency("euro", false, true), currency("Yen", false, true)];
        assert_eq!(pick_default(records).unwrap().name, "Yen");
    }

    #[test]
    fn test_fallback_tie_breaks_by_id() {
        let mut a = currency("Euro", false, true);
        let mut b = currency("Euro", false, true);
        if a.id > b.id {
            std::mem::swap(&mut a, &mut b);
        }
        let smaller = a.id;
        let records = vec![b, a];
        assert_eq!(pick_default(records).unwrap().id, smaller);
    }

    #[test]
    fn test_no_active_records() {
        let records = vec![currency("Euro", false, false)];
        assert!(pick_default(records).is_none());
        assert!(pick_default::<Currency>(Vec::new()).is_none());
    }
}
