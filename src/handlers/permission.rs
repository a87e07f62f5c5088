//! 权限目录的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState,
    repository::role_repo::RoleRepository,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 列出所有权限
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let repo = RoleRepository::new(state.db.clone());
    let permissions = repo.list_permissions().await?;

    Ok(Json(json!({
        "permissions": permissions,
        "count": permissions.len()
    })))
}

/// 当前主体的权限
pub async fn get_my_permissions(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let permissions = state
        .permission_service
        .get_user_permissions(auth_context.principal_id)
        .await?;

    Ok(Json(json!({
        "principal_id": auth_context.principal_id,
        "permissions": permissions
    })))
}

/// 指定主体的权限
pub async fn get_user_permissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let permissions = state
        .permission_service
        .get_user_permissions(user_id)
        .await?;

    Ok(Json(json!({
        "principal_id": user_id,
        "permissions": permissions
    })))
}
