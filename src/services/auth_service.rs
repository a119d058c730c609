//! 认证服务：登录、修改密码、重置密码

use crate::{
    auth::{
        gate::{Principal, Role},
        jwt::JwtService,
        password::PasswordHasher,
    },
    config::SecurityConfig,
    error::{AppError, AuthError},
    models::{auth::*, member::*},
    repository::MemberRepository,
};
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    members: Arc<dyn MemberRepository>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
    policy: SecurityConfig,
}

impl AuthService {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        jwt_service: Arc<JwtService>,
        hasher: Arc<PasswordHasher>,
        policy: SecurityConfig,
    ) -> Self {
        Self {
            members,
            jwt_service,
            hasher,
            policy,
        }
    }

    /// 会员登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        req.validate()?;

        let email = req.email.trim().to_lowercase();

        // 未知邮箱与密码错误返回相同的错误
        let Some(member) = self.members.find_by_email(&email).await? else {
            self.hasher.verify_decoy(&req.password);
            metrics::counter!("auth_login_total", "outcome" => "unknown_email").increment(1);
            tracing::info!("Login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let verification = self.hasher.verify(&req.password, &member.password_hash);
        if !verification.valid {
            metrics::counter!("auth_login_total", "outcome" => "bad_password").increment(1);
            tracing::info!(member_id = member.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        // 旧格式哈希在首次成功登录时升级
        if verification.needs_upgrade {
            self.upgrade_password_hash(&member, &req.password).await;
        }

        let token = self
            .jwt_service
            .issue_session_token(&member)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        tracing::info!(member_id = member.id, role = %member.role, "Member logged in");

        Ok(LoginResponse {
            success: true,
            token,
            expires_in: self.jwt_service.token_ttl_secs(),
            user: MemberResponse::from(member),
        })
    }

    /// 当前会员资料
    pub async fn current_member(&self, principal: &Principal) -> Result<MemberResponse, AppError> {
        let member = self.find_member(principal.user_id).await?;
        Ok(MemberResponse::from(member))
    }

    /// 会员修改自己的密码
    pub async fn change_password(
        &self,
        principal: &Principal,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        req.validate()?;

        let member = self.find_member(principal.user_id).await?;

        if !self
            .hasher
            .verify(&req.current_password, &member.password_hash)
            .valid
        {
            return Err(AppError::BadRequest("Current password is incorrect".to_string()));
        }

        PasswordHasher::validate_password_policy(&req.new_password, &self.policy)?;

        let password_hash = self.hasher.hash(&req.new_password);
        self.members.update_password(member.id, &password_hash).await?;

        tracing::info!(member_id = member.id, "Password changed");
        Ok(())
    }

    /// 管理员重置会员密码
    pub async fn reset_password(
        &self,
        actor: &Principal,
        member_id: i64,
        req: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        req.validate()?;
        PasswordHasher::validate_password_policy(&req.new_password, &self.policy)?;

        let target = self
            .members
            .find_by_id(member_id)
            .await?
            .ok_or(AppError::NotFound)?;

        // 不能重置比自己权限更高的账号
        let actor_role = actor.role().ok_or(AuthError::MissingRole)?;
        let target_role = Role::parse(&target.role).unwrap_or_default();
        if !actor_role.outranks_or_equals(&target_role) {
            tracing::warn!(
                member_id,
                actor_id = actor.user_id,
                actor_role = %actor_role,
                target_role = %target_role,
                "Password reset denied for higher-ranked member"
            );
            return Err(AuthError::PermissionDenied.into());
        }

        let password_hash = self.hasher.hash(&req.new_password);
        if !self.members.update_password(target.id, &password_hash).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(
            member_id,
            actor_id = actor.user_id,
            "Password reset by administrator"
        );
        Ok(())
    }

    async fn find_member(&self, user_id: u64) -> Result<Member, AppError> {
        let id = i64::try_from(user_id).map_err(|_| AppError::NotFound)?;
        self.members.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// 升级失败只记录日志，不影响登录
    async fn upgrade_password_hash(&self, member: &Member, password: &str) {
        let password_hash = self.hasher.hash(password);

        match self.members.update_password(member.id, &password_hash).await {
            Ok(_) => {
                metrics::counter!("auth_password_upgrades_total").increment(1);
                tracing::info!(member_id = member.id, "Legacy password hash upgraded");
            }
            Err(e) => {
                tracing::warn!(member_id = member.id, error = %e, "Failed to upgrade legacy password hash");
            }
        }
    }
}
