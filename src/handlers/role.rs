//! 角色管理的 HTTP 处理器
//! 角色、权限分配、菜单授权与看板组件，变更均写入审计日志

use crate::{
    error::AppError,
    middleware::AppState,
    models::{menu::AssignMenusRequest, role::*},
    repository::role_repo::RoleRepository,
    services::audit_service::AuditAction,
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

// ==================== Roles ====================

/// 列出所有角色
pub async fn list_roles(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let repo = RoleRepository::new(state.db.clone());
    let roles = repo.list().await?;

    Ok(Json(json!({
        "roles": roles,
        "count": roles.len()
    })))
}

/// 创建角色
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    validate_widget_keys(&req.dashboard_widgets)?;

    let repo = RoleRepository::new(state.db.clone());
    let role = repo.create(&req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::RoleCreate,
            Some(role.id),
            Some(&format!("Created role: {}", role.name)),
        )
        .await?;

    Ok(Json(json!({
        "message": "角色创建成功",
        "role": role
    })))
}

/// 获取角色详情
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = RoleRepository::new(state.db.clone());
    let role = repo
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;

    Ok(Json(json!({ "role": role })))
}

/// 更新角色
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = RoleRepository::new(state.db.clone());
    let role = repo.update(id, &req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::RoleUpdate,
            Some(role.id),
            Some(&format!("Updated role: {}", role.name)),
        )
        .await?;

    Ok(Json(json!({
        "message": "角色更新成功",
        "role": role
    })))
}

/// 删除角色
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = RoleRepository::new(state.db.clone());
    let role = repo.delete(id).await?;

    state
        .audit_service
        .log_action(
            AuditAction::RoleDelete,
            Some(id),
            Some(&format!("Deleted role: {}", role.name)),
        )
        .await?;

    Ok(Json(json!({
        "message": "角色删除成功"
    })))
}

// ==================== Permissions ====================

/// 获取角色的权限
pub async fn get_role_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = RoleRepository::new(state.db.clone());
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;

    let permissions = repo.get_role_permissions(id).await?;

    Ok(Json(json!({
        "role_id": id,
        "permissions": permissions
    })))
}

/// 整体替换角色的权限
pub async fn assign_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignPermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let repo = RoleRepository::new(state.db.clone());
    let permissions = repo.replace_permissions(id, &req.permission_ids).await?;

    state
        .audit_service
        .log_action(
            AuditAction::RolePermissionsAssign,
            Some(id),
            Some(&format!("Assigned {} permission(s)", permissions.len())),
        )
        .await?;

    Ok(Json(json!({
        "message": "权限分配成功",
        "role_id": id,
        "permissions": permissions
    })))
}

// ==================== Menus ====================

/// 角色的菜单授权
pub async fn get_role_menus(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let menus = state.menu_service.get_menus_for_role(id).await?;

    Ok(Json(menus))
}

/// 整体替换角色的菜单授权
pub async fn assign_menus(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignMenusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let menus = state
        .menu_service
        .assign_menus_to_role(id, &req.menu_item_ids)
        .await?;

    state
        .audit_service
        .log_action(
            AuditAction::RoleMenusAssign,
            Some(id),
            Some(&format!("Assigned {} menu item(s)", menus.menu_item_ids.len())),
        )
        .await?;

    Ok(Json(menus))
}

// ==================== Dashboard widgets ====================

/// 整体替换角色的看板组件
pub async fn set_widgets(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetWidgetsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_widget_keys(&req.widgets)?;

    let repo = RoleRepository::new(state.db.clone());
    let widgets = repo.replace_dashboard_widgets(id, &req.widgets).await?;

    state
        .audit_service
        .log_action(
            AuditAction::RoleWidgetsAssign,
            Some(id),
            Some(&format!("Set {} dashboard widget(s)", widgets.len())),
        )
        .await?;

    Ok(Json(json!({
        "role_id": id,
        "dashboard_widgets": widgets
    })))
}
