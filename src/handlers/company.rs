//! 公司的 HTTP 处理器

use crate::{
    error::AppError, handlers::currency::ListQuery, middleware::AppState, models::company::*,
    repository::company_repo::CompanyRepository, services::audit_service::AuditAction,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CompanyRepository::new(state.db.clone());
    let companies = repo.list(query.include_inactive).await?;

    Ok(Json(json!({
        "companies": companies,
        "count": companies.len()
    })))
}

pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CompanyRepository::new(state.db.clone());
    let company = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Company not found"))?;

    Ok(Json(json!({ "company": company })))
}

pub async fn create_company(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = CompanyRepository::new(state.db.clone());
    let company = repo.create(&req).await?;

    state
        .audit_service
        .log_action(
            AuditAction::CompanyCreate,
            Some(company.id),
            Some(&format!("Created company: {}", company.name)),
        )
        .await?;

    Ok(Json(json!({
        "message": "公司创建成功",
        "company": company
    })))
}

pub async fn update_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let repo = CompanyRepository::new(state.db.clone());
    let company = repo
        .update(id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Company not found"))?;

    state
        .audit_service
        .log_action(
            AuditAction::CompanyUpdate,
            Some(company.id),
            Some(&format!("Updated company: {}", company.name)),
        )
        .await?;

    Ok(Json(json!({
        "message": "公司更新成功",
        "company": company
    })))
}

/// 软删除
pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CompanyRepository::new(state.db.clone());
    if !repo.delete(id).await? {
        return Err(AppError::not_found("Company not found"));
    }

    state
        .audit_service
        .log_action(AuditAction::CompanyDelete, Some(id), None)
        .await?;

    Ok(Json(json!({
        "message": "公司已停用"
    })))
}

/// 设为主公司
pub async fn set_primary_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CompanyRepository::new(state.db.clone());
    let company = repo.set_primary(id).await?;

    state
        .audit_service
        .log_action(
            AuditAction::CompanySetPrimary,
            Some(id),
            Some(&format!("Primary company set to {}", company.name)),
        )
        .await?;

    Ok(Json(json!({
        "message": "主公司已更新",
        "company": company
    })))
}

/// 获取主公司；没有启用记录时返回 null
pub async fn get_primary_company(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let repo = CompanyRepository::new(state.db.clone());
    let company = repo.get_primary().await?;

    Ok(Json(json!({ "company": company })))
}
