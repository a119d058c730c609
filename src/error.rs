//! 统一错误模型
//! 定义令牌、认证与应用错误类型，以及错误响应格式

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

/// 非生产环境下是否在错误响应中附带诊断信息（启动时设置一次）
static EXPOSE_DETAIL: OnceCell<bool> = OnceCell::new();

/// 设置错误响应是否附带诊断信息
pub fn set_expose_detail(enabled: bool) {
    let _ = EXPOSE_DETAIL.set(enabled);
}

fn expose_detail() -> bool {
    EXPOSE_DETAIL.get().copied().unwrap_or(false)
}

/// base64url 解码失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid base64url input: {0}")]
pub struct DecodeError(pub String);

/// 令牌校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token payload")]
    InvalidPayload,

    #[error("Token expired")]
    TokenExpired,
}

/// 认证/授权错误，携带 HTTP 状态语义
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingAuthorization,

    #[error("Authorization token is empty")]
    EmptyToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Token does not identify a user")]
    MissingUserId,

    #[error("User role not found")]
    MissingRole,

    #[error("Insufficient permissions")]
    PermissionDenied,
}

impl AuthError {
    /// 401 表示凭据缺失或无效，403 表示身份已识别但角色不足
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization
            | AuthError::EmptyToken
            | AuthError::InvalidToken(_)
            | AuthError::MissingUserId => StatusCode::UNAUTHORIZED,
            AuthError::MissingRole | AuthError::PermissionDenied => StatusCode::FORBIDDEN,
        }
    }
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => e.status(),
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(e) => e.to_string(),
            AppError::InvalidCredentials => "Invalid email or password".to_string(),
            AppError::NotFound => "Resource not found".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Application error");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            success: false,
            error: self.user_message(),
            detail: expose_detail().then(|| format!("{:?}", self)),
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 请求体无法解析（JSON 格式错误、缺少字段、Content-Type 不对）
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// 路径参数无法解析
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// 请求体校验失败
impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidCredentials.code(), 401);
        assert_eq!(AppError::NotFound.code(), 404);
        assert_eq!(AppError::BadRequest("test".to_string()).code(), 400);
        assert_eq!(AppError::Internal("boom".to_string()).code(), 500);
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(AuthError::MissingAuthorization.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::EmptyToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InvalidToken(TokenError::TokenExpired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::MissingUserId.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MissingRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::from(AuthError::PermissionDenied).code(), 403);
    }

    #[test]
    fn test_invalid_token_carries_original_message() {
        let err = AuthError::from(TokenError::InvalidSignature);
        assert_eq!(err.to_string(), "Invalid token: Invalid token signature");
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        let message = error.user_message();
        assert_eq!(message, "Database error occurred");
        assert!(!message.contains("sqlx"));

        let error = AppError::Internal("pbkdf2 state".to_string());
        assert_eq!(error.user_message(), "Internal server error");
    }
}
