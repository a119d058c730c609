//! JWT 认证中间件与提取器

use crate::{
    auth::{
        gate::{self, Principal, ADMIN_OR_DIRECTOR_ROLES, ADMIN_ROLES},
        jwt::JwtService,
    },
    error::AuthError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = gate::require_auth(req.headers(), &jwt_service)?;

    tracing::debug!(user_id = principal.user_id, "Request authenticated");

    // 附加到请求扩展
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

fn principal_from_parts(parts: &Parts) -> Result<Principal, AuthError> {
    parts
        .extensions
        .get::<Principal>()
        .cloned()
        .ok_or(AuthError::MissingAuthorization)
}

// 实现 FromRequestParts 以便在 handler 中直接提取 Principal
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts)
    }
}

/// 仅管理员
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Principal);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        gate::authorize(principal_from_parts(parts)?, ADMIN_ROLES).map(AdminOnly)
    }
}

/// 管理员或理事
#[derive(Debug, Clone)]
pub struct AdminOrDirector(pub Principal);

impl<S> FromRequestParts<S> for AdminOrDirector
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        gate::authorize(principal_from_parts(parts)?, ADMIN_OR_DIRECTOR_ROLES).map(AdminOrDirector)
    }
}
