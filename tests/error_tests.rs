//! 错误处理测试
//!
//! 状态码映射、对外消息、响应体结构

use axum::{http::StatusCode, response::IntoResponse};
use fieldops_admin::error::{AppError, ErrorDetail, ErrorResponse};
use http_body_util::BodyExt;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::not_found("role").status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::conflict("menu key").status_code(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::BadRequest("invalid".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::Validation("error".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::Database(sqlx::Error::RowNotFound).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Config("bad".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_error_code_consistency() {
    let errors = vec![
        AppError::Unauthorized,
        AppError::Forbidden,
        AppError::NotFound("test".to_string()),
        AppError::Conflict("test".to_string()),
        AppError::BadRequest("test".to_string()),
        AppError::Validation("test".to_string()),
        AppError::Internal("test".to_string()),
    ];

    for error in errors {
        assert_eq!(error.code(), error.status_code().as_u16());
    }
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_no_sensitive_info() {
    let message = AppError::Database(sqlx::Error::RowNotFound).user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("row"));

    let message = AppError::Config("Missing JWT secret".to_string()).user_message();
    assert_eq!(message, "Configuration error");
    assert!(!message.contains("JWT"));

    let message = AppError::Internal("pool exhausted".to_string()).user_message();
    assert_eq!(message, "Internal server error");
}

#[test]
fn test_user_messages_for_client_errors() {
    assert_eq!(AppError::Unauthorized.user_message(), "Authentication required");
    assert_eq!(AppError::Forbidden.user_message(), "Access denied");
    assert_eq!(
        AppError::not_found("Role not found").user_message(),
        "Resource not found: Role not found"
    );
    assert_eq!(
        AppError::conflict("System role admin cannot be modified").user_message(),
        "System role admin cannot be modified"
    );
}

// ==================== From 转换测试 ====================

#[test]
fn test_from_sqlx_error() {
    let app_error = AppError::from(sqlx::Error::RowNotFound);
    assert!(matches!(app_error, AppError::Database(_)));
}

#[test]
fn test_from_config_error() {
    let app_error = AppError::from(config::ConfigError::Message("missing".to_string()));
    assert!(matches!(app_error, AppError::Config(_)));
}

#[test]
fn test_non_unique_violation_stays_database_error() {
    let app_error =
        AppError::from_unique_violation(sqlx::Error::PoolTimedOut, "currencies_code_key", "dup");
    assert!(matches!(app_error, AppError::Database(_)));
}

/// 模拟 Postgres 返回的约束错误
#[derive(Debug)]
struct ConstraintError {
    code: &'static str,
    constraint: &'static str,
}

impl std::fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "violates constraint {}", self.constraint)
    }
}

impl std::error::Error for ConstraintError {}

impl sqlx::error::DatabaseError for ConstraintError {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
        Some(std::borrow::Cow::Borrowed(self.code))
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

fn unique_violation(constraint: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(ConstraintError {
        code: "23505",
        constraint,
    }))
}

#[test]
fn test_named_unique_constraint_maps_to_conflict() {
    let app_error = AppError::from_unique_violation(
        unique_violation("currencies_code_key"),
        "currencies_code_key",
        "Currency code already exists",
    );
    match app_error {
        AppError::Conflict(msg) => assert_eq!(msg, "Currency code already exists"),
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test]
fn test_other_unique_constraint_stays_database_error() {
    // 默认标记的部分唯一索引不能被报告为重复的币种代码
    let app_error = AppError::from_unique_violation(
        unique_violation("uq_currencies_single_default"),
        "currencies_code_key",
        "Currency code already exists",
    );
    assert!(matches!(app_error, AppError::Database(_)));
    assert_eq!(app_error.code(), 500);
}

#[test]
fn test_other_sqlstate_on_same_constraint_stays_database_error() {
    let err = sqlx::Error::Database(Box::new(ConstraintError {
        code: "23503",
        constraint: "currencies_code_key",
    }));
    let app_error = AppError::from_unique_violation(err, "currencies_code_key", "dup");
    assert!(matches!(app_error, AppError::Database(_)));
}

// ==================== 错误响应测试 ====================

#[test]
fn test_error_response_serialization() {
    let error_response = ErrorResponse {
        error: ErrorDetail {
            code: 409,
            message: "Menu key already exists".to_string(),
            request_id: "req-123".to_string(),
        },
    };

    let json = serde_json::to_value(&error_response).unwrap();

    assert_eq!(json["error"]["code"], 409);
    assert_eq!(json["error"]["message"], "Menu key already exists");
    assert_eq!(json["error"]["request_id"], "req-123");
}

#[tokio::test]
async fn test_into_response_body() {
    let response = AppError::Forbidden.into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["code"], 403);
    assert_eq!(json["error"]["message"], "Access denied");
    assert!(json["error"]["request_id"].is_string());
}

#[test]
fn test_error_result_type() {
    type TestResult = fieldops_admin::error::Result<String>;

    let ok_result: TestResult = Ok("success".to_string());
    assert!(ok_result.is_ok());

    let err_result: TestResult = Err(AppError::Unauthorized);
    assert!(matches!(err_result, Err(AppError::Unauthorized)));
}
