//! 管理后台处理器（需要管理员或理事角色）

use crate::{
    auth::AdminOrDirector,
    error::AppError,
    extract::{ApiJson, ApiPath},
    middleware::AppState,
    models::auth::ResetPasswordRequest,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 重置会员密码
pub async fn reset_member_password(
    State(state): State<Arc<AppState>>,
    AdminOrDirector(actor): AdminOrDirector,
    ApiPath(member_id): ApiPath<i64>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .reset_password(&actor, member_id, req)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password reset"
    })))
}
