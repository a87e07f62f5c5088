//! 健康检查处理器
//! 提供 /health 和 /ready 端点

use axum::{extract::State, Json};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::{db, middleware::AppState};

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// 就绪探针响应
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static APP_START_TIME: OnceCell<Instant> = OnceCell::new();

/// 设置应用启动时间（main 中调用一次）
pub fn set_start_time() {
    let _ = APP_START_TIME.set(Instant::now());
}

/// 应用运行时间（秒）
pub fn get_uptime() -> u64 {
    APP_START_TIME
        .get()
        .map_or(0, |start| start.elapsed().as_secs())
}

/// 存活探针
/// 快速响应，不检查依赖
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}

/// 就绪探针
/// 检查数据库连接和种子数据（权限目录、系统角色）
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let status = db::check_readiness(&state.db).await;
    Json(readiness_from(&status))
}

fn readiness_from(status: &db::DatabaseStatus) -> ReadinessResponse {
    let database = HealthCheck {
        name: "database".to_string(),
        status: healthy_label(status.reachable),
        message: match &status.error {
            Some(msg) => Some(msg.clone()),
            None => Some(format!("{} ms", status.latency_ms)),
        },
    };

    let seed = HealthCheck {
        name: "seed".to_string(),
        status: healthy_label(status.is_seeded()),
        message: (status.reachable && !status.is_seeded())
            .then(|| "permission catalog or system role missing, run with --seed".to_string()),
    };

    let checks = vec![database, seed];
    let ready = checks.iter().all(|c| c.status == "healthy");

    ReadinessResponse { ready, checks }
}

fn healthy_label(ok: bool) -> String {
    if ok { "healthy" } else { "unhealthy" }.to_string()
}
