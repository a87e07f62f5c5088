//! 数据库连接池、迁移与就绪探测
//!
//! 访问判定与菜单解析都依赖权限目录和系统角色已经写入，
//! 所以就绪探测除了连通性还会检查种子数据。

use crate::{auth::catalog::PERMISSION_CATALOG, config::DatabaseConfig, error::AppError};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::{Duration, Instant};

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to connect to database"))?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// 执行内嵌迁移
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(sqlx::Error::from)
        .inspect_err(|e| tracing::error!(error = %e, "Migration failed"))?;

    tracing::info!("Migrations applied");
    Ok(())
}

/// 数据库就绪状态
#[derive(Debug, Clone, Default)]
pub struct DatabaseStatus {
    pub reachable: bool,
    pub latency_ms: u64,
    /// 已写入的权限条目数
    pub permissions: i64,
    /// 系统角色数
    pub system_roles: i64,
    pub error: Option<String>,
}

impl DatabaseStatus {
    /// 权限目录完整且至少有一个系统角色
    pub fn is_seeded(&self) -> bool {
        self.reachable
            && self.system_roles > 0
            && self.permissions >= PERMISSION_CATALOG.len() as i64
    }
}

/// 探测数据库：连通性、延迟、种子数据，并刷新连接池指标
pub async fn check_readiness(pool: &PgPool) -> DatabaseStatus {
    let started = Instant::now();

    let counts = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM permissions),
            (SELECT COUNT(*) FROM roles WHERE is_system)
        "#,
    )
    .fetch_one(pool)
    .await;

    metrics::gauge!("db.pool.size").set(pool.size() as f64);
    metrics::gauge!("db.pool.idle").set(pool.num_idle() as f64);

    let latency_ms = started.elapsed().as_millis() as u64;

    match counts {
        Ok((permissions, system_roles)) => DatabaseStatus {
            reachable: true,
            latency_ms,
            permissions,
            system_roles,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database readiness check failed");
            DatabaseStatus {
                latency_ms,
                error: Some(e.to_string()),
                ..DatabaseStatus::default()
            }
        }
    }
}
