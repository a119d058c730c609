//! Authentication-related models

use super::member::MemberResponse;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_in: u64,
    pub user: MemberResponse,
}

/// Password change by the signed-in member
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 1024, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(max = 1024))]
    pub new_password: String,
}

/// Password reset performed by an administrator
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(max = 1024))]
    pub new_password: String,
}
