//! 路由注册
//! 创建所有 API 路由并应用中间件
//!
//! 每条受保护路由单独挂一个权限守卫（route_layer），处理器执行前完成判定。
//! 中间件由外到内：请求追踪 → 压缩 / 请求体上限 → 审计作用域 → IP 白名单 → JWT 认证 → 权限守卫。

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

use crate::{
    auth::{
        catalog::{action, resource},
        guard::{permission_guard_middleware, PermissionGuard},
        middleware::jwt_auth_middleware,
    },
    handlers,
    middleware::{
        audit_context_middleware, ip_whitelist_middleware, request_tracking_middleware, AppState,
    },
    services::PermissionService,
};

type Route = MethodRouter<Arc<AppState>>;

/// 管理接口的请求体上限
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 给单个方法路由挂上 (resource, action) 守卫
fn guarded(
    permission_service: &Arc<PermissionService>,
    resource: &'static str,
    action: &'static str,
    route: Route,
) -> Route {
    route.route_layer(from_fn_with_state(
        PermissionGuard::new(permission_service.clone(), resource, action),
        permission_guard_middleware,
    ))
}

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let ps = state.permission_service.clone();
    let g = |res: &'static str, act: &'static str, route: Route| guarded(&ps, res, act, route);

    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    let authenticated_routes = Router::new()
        // 权限目录
        .route(
            "/api/v1/permissions",
            g(resource::PERMISSIONS, action::READ, get(handlers::permission::list_permissions)),
        )
        // 当前主体：只需认证
        .route("/api/v1/me/permissions", get(handlers::permission::get_my_permissions))
        .route("/api/v1/menus/me", get(handlers::menu::get_my_menus))

        // 角色
        .route("/api/v1/roles", g(resource::ROLES, action::READ, get(handlers::role::list_roles)))
        .route("/api/v1/roles", g(resource::ROLES, action::WRITE, post(handlers::role::create_role)))
        .route("/api/v1/roles/{id}", g(resource::ROLES, action::READ, get(handlers::role::get_role)))
        .route("/api/v1/roles/{id}", g(resource::ROLES, action::WRITE, put(handlers::role::update_role)))
        .route(
            "/api/v1/roles/{id}",
            g(resource::ROLES, action::DELETE, axum::routing::delete(handlers::role::delete_role)),
        )
        .route(
            "/api/v1/roles/{id}/permissions",
            g(resource::ROLES, action::READ, get(handlers::role::get_role_permissions)),
        )
        .route(
            "/api/v1/roles/{id}/permissions",
            g(resource::PERMISSIONS, action::WRITE, put(handlers::role::assign_permissions)),
        )
        .route(
            "/api/v1/roles/{id}/menus",
            g(resource::ROLES, action::READ, get(handlers::role::get_role_menus)),
        )
        .route(
            "/api/v1/roles/{id}/menus",
            g(resource::MENUS, action::WRITE, put(handlers::role::assign_menus)),
        )
        .route(
            "/api/v1/roles/{id}/widgets",
            g(resource::ROLES, action::WRITE, put(handlers::role::set_widgets)),
        )

        // 主体
        .route("/api/v1/users", g(resource::USERS, action::WRITE, post(handlers::user::create_user)))
        .route("/api/v1/users/{id}", g(resource::USERS, action::READ, get(handlers::user::get_user)))
        .route(
            "/api/v1/users/{id}/role",
            g(resource::USERS, action::WRITE, put(handlers::user::assign_role)),
        )
        .route(
            "/api/v1/users/{id}/permissions",
            g(resource::PERMISSIONS, action::READ, get(handlers::permission::get_user_permissions)),
        )

        // 菜单目录
        .route("/api/v1/menus", g(resource::MENUS, action::READ, get(handlers::menu::list_menu_items)))
        .route("/api/v1/menus", g(resource::MENUS, action::WRITE, post(handlers::menu::create_menu_item)))
        .route("/api/v1/menus/tree", g(resource::MENUS, action::READ, get(handlers::menu::get_menu_tree)))
        .route("/api/v1/menus/{id}", g(resource::MENUS, action::READ, get(handlers::menu::get_menu_item)))
        .route("/api/v1/menus/{id}", g(resource::MENUS, action::WRITE, put(handlers::menu::update_menu_item)))
        .route(
            "/api/v1/menus/{id}",
            g(resource::MENUS, action::DELETE, axum::routing::delete(handlers::menu::delete_menu_item)),
        )

        // 币种
        .route(
            "/api/v1/currencies",
            g(resource::CURRENCIES, action::READ, get(handlers::currency::list_currencies)),
        )
        .route(
            "/api/v1/currencies",
            g(resource::CURRENCIES, action::WRITE, post(handlers::currency::create_currency)),
        )
        .route(
            "/api/v1/currencies/default",
            g(resource::CURRENCIES, action::READ, get(handlers::currency::get_default_currency)),
        )
        .route(
            "/api/v1/currencies/{id}",
            g(resource::CURRENCIES, action::READ, get(handlers::currency::get_currency)),
        )
        .route(
            "/api/v1/currencies/{id}",
            g(resource::CURRENCIES, action::WRITE, put(handlers::currency::update_currency)),
        )
        .route(
            "/api/v1/currencies/{id}",
            g(
                resource::CURRENCIES,
                action::DELETE,
                axum::routing::delete(handlers::currency::delete_currency),
            ),
        )
        .route(
            "/api/v1/currencies/{id}/default",
            g(resource::CURRENCIES, action::WRITE, post(handlers::currency::set_default_currency)),
        )

        // 公司
        .route(
            "/api/v1/companies",
            g(resource::COMPANIES, action::READ, get(handlers::company::list_companies)),
        )
        .route(
            "/api/v1/companies",
            g(resource::COMPANIES, action::WRITE, post(handlers::company::create_company)),
        )
        .route(
            "/api/v1/companies/default",
            g(resource::COMPANIES, action::READ, get(handlers::company::get_primary_company)),
        )
        .route(
            "/api/v1/companies/{id}",
            g(resource::COMPANIES, action::READ, get(handlers::company::get_company)),
        )
        .route(
            "/api/v1/companies/{id}",
            g(resource::COMPANIES, action::WRITE, put(handlers::company::update_company)),
        )
        .route(
            "/api/v1/companies/{id}",
            g(
                resource::COMPANIES,
                action::DELETE,
                axum::routing::delete(handlers::company::delete_company),
            ),
        )
        .route(
            "/api/v1/companies/{id}/default",
            g(resource::COMPANIES, action::WRITE, post(handlers::company::set_primary_company)),
        )

        // 审计日志
        .route(
            "/api/v1/audit/logs",
            g(resource::AUDIT, action::READ, get(handlers::audit::list_audit_logs)),
        )
        .route_layer(from_fn_with_state(state.jwt_service.clone(), jwt_auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(from_fn_with_state(state.clone(), ip_whitelist_middleware))
        .layer(from_fn(audit_context_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(from_fn(request_tracking_middleware))
        .with_state(state)
}
