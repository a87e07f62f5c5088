//! 主体管理的 HTTP 处理器

use crate::{
    error::AppError, middleware::AppState, models::user::*,
    repository::user_repo::UserRepository, services::audit_service::AuditAction,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 创建主体记录
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.create(&req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::UserCreate,
            Some(user.id),
            Some(&format!("Created user: {}", user.username)),
        )
        .await?;

    Ok(Json(json!({
        "message": "用户创建成功",
        "user": user
    })))
}

/// 获取主体
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(json!({ "user": user })))
}

/// 设置或清除主体的角色
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignUserRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo.assign_role(id, req.role_id).await?;

    let summary = match req.role_id {
        Some(role_id) => format!("Assigned role {} to {}", role_id, user.username),
        None => format!("Cleared role of {}", user.username),
    };

    state
        .audit_service
        .log_action(AuditAction::UserRoleAssign, Some(user.id), Some(&summary))
        .await?;

    Ok(Json(json!({
        "message": "角色分配成功",
        "user": user
    })))
}
