//! Auth gate: turns an inbound request into a [`Principal`] or a typed [`AuthError`]

use crate::{
    auth::jwt::{Claims, JwtService},
    error::{AuthError, TokenError},
};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Member roles
///
/// `SuperAdmin` passes every role check regardless of the allow-list.
/// Unrecognized roles are kept lowercased in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Role {
    SuperAdmin,
    Admin,
    Director,
    DirectorEditor,
    #[default]
    Member,
    Other(String),
}

impl Role {
    /// Parse a role name case-insensitively; blank names yield `None`
    pub fn parse(name: &str) -> Option<Role> {
        let name = name.trim().to_lowercase();
        let role = match name.as_str() {
            "" => return None,
            "super_admin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "director" => Role::Director,
            "director_editor" => Role::DirectorEditor,
            "member" => Role::Member,
            _ => Role::Other(name),
        };
        Some(role)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Director => "director",
            Role::DirectorEditor => "director_editor",
            Role::Member => "member",
            Role::Other(name) => name,
        }
    }

    /// Whether this role skips allow-list checks
    pub fn bypasses_role_checks(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// Position in the hierarchy; unrecognized roles rank lowest
    pub fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Admin => 3,
            Role::Director | Role::DirectorEditor => 2,
            Role::Member => 1,
            Role::Other(_) => 0,
        }
    }

    /// Whether this role may act on an account holding `other`
    pub fn outranks_or_equals(&self, other: &Role) -> bool {
        self.rank() >= other.rank()
    }

    /// Whether this role satisfies `allowed`
    pub fn is_allowed(&self, allowed: &[Role]) -> bool {
        self.bypasses_role_checks() || allowed.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles accepted by [`require_admin`]
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];

/// Roles accepted by [`require_admin_or_director`]
pub const ADMIN_OR_DIRECTOR_ROLES: &[Role] = &[Role::Admin, Role::Director, Role::DirectorEditor];

/// Authenticated identity for the current request
///
/// Serializes as the token claims, with `userId` normalized to a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    #[serde(skip)]
    pub user_id: u64,
    #[serde(flatten)]
    pub claims: Claims,
}

impl Principal {
    /// Resolved role, see [`get_role`]
    pub fn role(&self) -> Option<Role> {
        get_role(&self.claims)
    }

    /// Role names carried by the token
    pub fn roles(&self) -> Vec<String> {
        match &self.claims.roles {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.email.as_deref()
    }
}

/// Extract the bearer token from the `Authorization` header
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken(TokenError::MalformedToken))?
        .trim();

    let token = match value.get(..6) {
        Some(scheme)
            if scheme.eq_ignore_ascii_case("bearer")
                && value[6..].chars().next().map_or(true, char::is_whitespace) =>
        {
            value[6..].trim()
        }
        _ => value,
    };

    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }

    Ok(token)
}

/// Authenticate the request
pub fn require_auth(headers: &HeaderMap, jwt: &JwtService) -> Result<Principal, AuthError> {
    let token = extract_token(headers)?;
    let mut claims = jwt.verify(token)?;

    let user_id = resolve_user_id(&claims).ok_or(AuthError::MissingUserId)?;
    claims.user_id = Some(Value::from(user_id));

    Ok(Principal { user_id, claims })
}

/// First present id claim among `userId`, `user_id`, `sub`, `id`, as a positive integer
fn resolve_user_id(claims: &Claims) -> Option<u64> {
    let raw = [&claims.user_id, &claims.snake_user_id, &claims.sub, &claims.id]
        .into_iter()
        .find_map(Option::as_ref)?;

    let number = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.is_finite() && number > 0.0 && number.fract() == 0.0 && number <= u64::MAX as f64 {
        Some(number as u64)
    } else {
        None
    }
}

/// Resolve the role from `role`, `roles[0]`, `userRole`, in that order
pub fn get_role(claims: &Claims) -> Option<Role> {
    let first_of_roles = match &claims.roles {
        Some(Value::Array(values)) => values.first(),
        _ => None,
    };

    [claims.role.as_ref(), first_of_roles, claims.user_role.as_ref()]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find_map(Role::parse)
}

/// Check an authenticated principal against `allowed`
///
/// On success `role` is normalized and `roles` is guaranteed to contain it.
pub fn authorize(mut principal: Principal, allowed: &[Role]) -> Result<Principal, AuthError> {
    let role = principal.role().ok_or(AuthError::MissingRole)?;

    if !role.is_allowed(allowed) {
        tracing::debug!(
            user_id = principal.user_id,
            role = %role,
            "Role not permitted"
        );
        return Err(AuthError::PermissionDenied);
    }

    let mut roles = principal.roles();
    if !roles.iter().any(|r| r.eq_ignore_ascii_case(role.as_str())) {
        roles.insert(0, role.as_str().to_string());
    }

    principal.claims.role = Some(Value::from(role.as_str()));
    principal.claims.roles = Some(Value::from(roles));

    Ok(principal)
}

/// Authenticate and require one of `allowed`
pub fn require_role(
    headers: &HeaderMap,
    jwt: &JwtService,
    allowed: &[Role],
) -> Result<Principal, AuthError> {
    authorize(require_auth(headers, jwt)?, allowed)
}

pub fn require_admin(headers: &HeaderMap, jwt: &JwtService) -> Result<Principal, AuthError> {
    require_role(headers, jwt, ADMIN_ROLES)
}

pub fn require_admin_or_director(
    headers: &HeaderMap,
    jwt: &JwtService,
) -> Result<Principal, AuthError> {
    require_role(headers, jwt, ADMIN_OR_DIRECTOR_ROLES)
}
