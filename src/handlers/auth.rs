//! 认证相关的 HTTP 处理器

use crate::{
    auth::Principal, error::AppError, extract::ApiJson, middleware::AppState, models::auth::*,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(response))
}

/// 当前登录会员
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    let member = state.auth_service.current_member(&principal).await?;

    Ok(Json(json!({
        "success": true,
        "user": member,
        "session": {
            "userId": principal.user_id,
            "role": principal.role().map(|r| r.to_string()),
            "roles": principal.roles(),
            "exp": principal.claims.exp,
        }
    })))
}

/// 修改密码
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.change_password(&principal, req).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated"
    })))
}
