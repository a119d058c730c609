//! Session token issuing and verification
//! HS256 three-part tokens: base64url(header).base64url(payload).base64url(hmac)

use crate::{
    auth::{codec, gate::Role},
    config::AppConfig,
    error::TokenError,
    models::member::Member,
};
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed token header
#[derive(Debug, Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Token payload
///
/// `exp` and `iat` are required. Identity and role claims stay loosely typed
/// because tokens from older clients spell them differently; the auth gate
/// normalizes them. Unknown claims are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,

    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub snake_user_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Value>,

    #[serde(rename = "userRole", default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Value>,

    #[serde(rename = "isAdmin", default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,

    /// Expiration (Unix seconds)
    pub exp: i64,

    /// Issued at (Unix seconds)
    pub iat: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Bare claims valid from `iat` until `exp`
    pub fn new(iat: i64, exp: i64) -> Self {
        Self {
            user_id: None,
            snake_user_id: None,
            sub: None,
            id: None,
            email: None,
            role: None,
            roles: None,
            user_role: None,
            is_admin: None,
            exp,
            iat,
            extra: Map::new(),
        }
    }

    /// Session claims for a member signing in at `now`
    pub fn for_member(member: &Member, now: i64, ttl_secs: u64) -> Self {
        let role = Role::parse(&member.role).unwrap_or_default();
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);

        Self {
            user_id: Some(Value::from(member.id)),
            email: Some(member.email.clone()),
            role: Some(Value::from(role.as_str())),
            roles: Some(Value::from(vec![role.as_str()])),
            is_admin: Some(role.is_admin()),
            ..Self::new(now, now.saturating_add(ttl))
        }
    }
}

/// Sign `claims` into a token
pub fn issue(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = serde_json::to_vec(&HEADER).map_err(|_| TokenError::InvalidPayload)?;
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::InvalidPayload)?;

    let signing_input = format!("{}.{}", codec::encode(header), codec::encode(payload));
    let signature = codec::sign(secret.as_bytes(), signing_input.as_bytes());

    Ok(format!("{}.{}", signing_input, codec::encode(signature)))
}

/// Verify a token against the current time
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    verify_at(token, secret, Utc::now().timestamp())
}

/// Verify a token as of `now` (Unix seconds)
pub fn verify_at(token: &str, secret: &str, now: i64) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = parts[..] else {
        return Err(TokenError::MalformedToken);
    };

    let signature = codec::decode(signature).map_err(|_| TokenError::InvalidSignature)?;
    let signing_input = format!("{}.{}", header, payload);
    if !codec::verify(secret.as_bytes(), signing_input.as_bytes(), &signature) {
        return Err(TokenError::InvalidSignature);
    }

    let payload = codec::decode(payload).map_err(|_| TokenError::InvalidPayload)?;
    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| TokenError::InvalidPayload)?;

    if claims.exp < now {
        return Err(TokenError::TokenExpired);
    }

    Ok(claims)
}

/// Token service bound to the server secret and session lifetime
pub struct JwtService {
    secret: Secret<String>,
    token_ttl_secs: u64,
}

impl JwtService {
    pub fn new(secret: Secret<String>, token_ttl_secs: u64) -> Self {
        Self {
            secret,
            token_ttl_secs,
        }
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.security.jwt_secret.clone(),
            config.security.token_ttl_secs,
        )
    }

    /// Session lifetime in seconds
    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }

    /// Issue a session token for a member
    pub fn issue_session_token(&self, member: &Member) -> Result<String, TokenError> {
        let claims = Claims::for_member(member, Utc::now().timestamp(), self.token_ttl_secs);
        self.issue(&claims)
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        issue(claims, self.secret.expose_secret()).map_err(|e| {
            tracing::error!("Failed to encode session token: {}", e);
            e
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, self.secret.expose_secret()).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            e
        })
    }
}
