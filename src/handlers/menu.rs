//! 菜单目录与导航的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::menu::*,
    repository::menu_repo::MenuRepository,
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

/// 当前主体可见的菜单
pub async fn get_my_menus(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let menus = state
        .menu_service
        .get_menus_for_user(auth_context.principal_id)
        .await?;

    Ok(Json(json!({ "menus": menus })))
}

/// 扁平目录
pub async fn list_menu_items(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let repo = MenuRepository::new(state.db.clone());
    let items = repo.list_all().await?;

    Ok(Json(json!({
        "items": items,
        "count": items.len()
    })))
}

/// 完整目录树
pub async fn get_menu_tree(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let tree = state.menu_service.get_full_tree().await?;

    Ok(Json(json!({ "menus": tree })))
}

/// 获取菜单项
pub async fn get_menu_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = MenuRepository::new(state.db.clone());
    let item = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item not found"))?;

    Ok(Json(json!({ "item": item })))
}

/// 创建菜单项
pub async fn create_menu_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMenuItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = MenuRepository::new(state.db.clone());
    let item = repo.create(&req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::MenuItemCreate,
            Some(item.id),
            Some(&format!("Created menu item: {}", item.key)),
        )
        .await?;

    Ok(Json(json!({
        "message": "菜单项创建成功",
        "item": item
    })))
}

/// 更新菜单项
pub async fn update_menu_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMenuItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = MenuRepository::new(state.db.clone());
    let item = repo.update(id, &req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::MenuItemUpdate,
            Some(item.id),
            Some(&format!("Updated menu item: {}", item.key)),
        )
        .await?;

    Ok(Json(json!({
        "message": "菜单项更新成功",
        "item": item
    })))
}

/// 删除菜单项
pub async fn delete_menu_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = MenuRepository::new(state.db.clone());
    let item = repo.delete(id).await?;

    state
        .audit_service
        .log_action(
            AuditAction::MenuItemDelete,
            Some(id),
            Some(&format!("Deleted menu item: {}", item.key)),
        )
        .await?;

    Ok(Json(json!({
        "message": "菜单项删除成功"
    })))
}
