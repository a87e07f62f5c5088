//! 审计日志的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::audit::AuditLogFilters};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 查询审计日志
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<AuditLogFilters>,
) -> Result<impl IntoResponse, AppError> {
    let logs = state.audit_service.query_logs(&filters).await?;

    Ok(Json(json!({
        "logs": logs,
        "count": logs.len()
    })))
}
