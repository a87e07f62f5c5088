//! 币种的 HTTP 处理器

use crate::{
    error::AppError, middleware::AppState, models::currency::*,
    repository::currency_repo::CurrencyRepository, services::audit_service::AuditAction,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_currencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CurrencyRepository::new(state.db.clone());
    let currencies = repo.list(query.include_inactive).await?;

    Ok(Json(json!({
        "currencies": currencies,
        "count": currencies.len()
    })))
}

pub async fn get_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Currency not found"))?;

    Ok(Json(json!({ "currency": currency })))
}

pub async fn create_currency(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCurrencyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo.create(&req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::CurrencyCreate,
            Some(currency.id),
            Some(&format!("Created currency: {}", currency.code)),
        )
        .await?;

    Ok(Json(json!({
        "message": "币种创建成功",
        "currency": currency
    })))
}

pub async fn update_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCurrencyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo
        .update(id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Currency not found"))?;

    state
        .audit_service
        .log_action(
            AuditAction::CurrencyUpdate,
            Some(currency.id),
            Some(&format!("Updated currency: {}", currency.code)),
        )
        .await?;

    Ok(Json(json!({
        "message": "币种更新成功",
        "currency": currency
    })))
}

/// 软删除
pub async fn delete_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CurrencyRepository::new(state.db.clone());
    if !repo.delete(id).await? {
        return Err(AppError::not_found("Currency not found"));
    }

    state
        .audit_service
        .log_action(AuditAction::CurrencyDelete, Some(id), None)
        .await?;

    Ok(Json(json!({
        "message": "币种已停用"
    })))
}

/// 设为默认币种
pub async fn set_default_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo.set_default(id).await?;

    state
        .audit_service
        .log_action(
            AuditAction::CurrencySetDefault,
            Some(id),
            Some(&format!("Default currency set to {}", currency.code)),
        )
        .await?;

    Ok(Json(json!({
        "message": "默认币种已更新",
        "currency": currency
    })))
}

/// 获取默认币种；没有启用记录时返回 null
pub async fn get_default_currency(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo.get_default().await?;

    Ok(Json(json!({ "currency": currency })))
}
