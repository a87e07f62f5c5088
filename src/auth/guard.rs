//! 路由权限守卫
//! 以 route_layer 挂载，处理器执行前完成访问判定，拒绝时不产生任何副作用

use crate::{auth::middleware::AuthContext, error::AppError, services::PermissionService};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 单条路由所需的 (resource, action)
#[derive(Clone)]
pub struct PermissionGuard {
    permission_service: Arc<PermissionService>,
    resource: &'static str,
    action: &'static str,
}

impl PermissionGuard {
    pub fn new(
        permission_service: Arc<PermissionService>,
        resource: &'static str,
        action: &'static str,
    ) -> Self {
        Self {
            permission_service,
            resource,
            action,
        }
    }
}

/// 权限守卫中间件
pub async fn permission_guard_middleware(
    State(guard): State<PermissionGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal_id = req
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.principal_id);

    guard
        .permission_service
        .authorize(principal_id, guard.resource, guard.action)
        .await?;

    Ok(next.run(req).await)
}
