//! Token Decoding
//!
//! Extracts token-issued permissions from an access token's claims.
//! Two decoders are provided:
//! - [`JwtDecoder`]: signature verified with the shared secret
//! - [`UnverifiedClaimsDecoder`]: payload only, for clients that never hold the secret
//!
//! Callers treat any [`TokenError`] as "no token-issued permissions" and fall
//! back to role defaults.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use shared::{AppError, ErrorCode, Permission, Role};
use std::collections::HashSet;
use thiserror::Error;

/// JWT 验证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// 验证密钥
    pub secret: String,
    /// 期望的签发者 (None = 不校验)
    pub issuer: Option<String>,
    /// 期望的受众 (None = 不校验)
    pub audience: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Read `JWT_SECRET`, `JWT_ISSUER` and `JWT_AUDIENCE`.
    ///
    /// The secret is required; issuer and audience are optional.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TokenError::Config("JWT_SECRET is not set".to_string()))?;

        Ok(Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty()),
            audience: std::env::var("JWT_AUDIENCE").ok().filter(|s| !s.is_empty()),
        })
    }
}

/// Permission claim as issued: either a JSON array or a comma-joined string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionClaim {
    List(Vec<String>),
    Joined(String),
}

impl PermissionClaim {
    /// Raw permission strings, empty entries removed
    pub fn entries(&self) -> Vec<&str> {
        match self {
            PermissionClaim::List(items) => items.iter().map(|s| s.trim()).collect::<Vec<_>>(),
            PermissionClaim::Joined(joined) => joined.split(',').map(str::trim).collect::<Vec<_>>(),
        }
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
    }
}

/// 令牌中的 Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (Subject)
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// 角色名称 (current or legacy naming)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// The role claim, accepting the legacy role names
    pub fn role(&self) -> Option<Role> {
        self.role
            .as_deref()
            .and_then(|r| Role::from_legacy(r).ok())
    }

    /// Parse the permission claim.
    ///
    /// Malformed entries are dropped; a missing claim is an error.
    pub fn permission_set(&self) -> Result<HashSet<Permission>, TokenError> {
        let claim = self
            .permissions
            .as_ref()
            .ok_or(TokenError::NoPermissionClaims)?;

        let mut set = HashSet::new();
        for raw in claim.entries() {
            match raw.parse::<Permission>() {
                Ok(p) => {
                    set.insert(p);
                }
                Err(_) => {
                    tracing::warn!(permission = raw, "Malformed permission claim dropped");
                }
            }
        }
        Ok(set)
    }
}

/// Token 错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token carries no permission claims")]
    NoPermissionClaims,

    #[error("Malformed token payload: {0}")]
    Malformed(String),

    #[error("Token configuration error: {0}")]
    Config(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        let code = match &err {
            TokenError::Expired => ErrorCode::TokenExpired,
            TokenError::Config(_) => ErrorCode::ConfigError,
            _ => ErrorCode::TokenInvalid,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Turns an opaque access token into claims and a permission set
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;

    fn permissions(&self, token: &str) -> Result<HashSet<Permission>, TokenError> {
        self.decode(token)?.permission_set()
    }
}

/// Signature-verifying decoder (HS256)
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        match &config.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &config.issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

impl TokenDecoder for JwtDecoder {
    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidToken => TokenError::InvalidToken(e.to_string()),
                _ => TokenError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;
        Ok(data.claims)
    }
}

/// Payload-only decoder.
///
/// Reads the claims without checking the signature; the server remains the
/// enforcement boundary. Expiry is still honoured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnverifiedClaimsDecoder;

impl TokenDecoder for UnverifiedClaimsDecoder {
    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        // JWT 格式: header.payload.signature
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::InvalidToken(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|e| TokenError::Malformed(e.to_string()))?;

        if let Some(exp) = claims.exp
            && exp < chrono::Utc::now().timestamp()
        {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
