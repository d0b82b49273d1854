use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::auth::Claims;
use crate::config;
use crate::error::ApiError;

/// Resolved caller identity extracted from a valid bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Caller context, resolved once per request and passed explicitly to every
/// handler. Public reads accept `Anonymous`; mutations call `require`.
#[derive(Clone, Debug)]
pub enum AuthContext {
    Anonymous,
    Authenticated(AuthUser),
    Invalid(String),
}

impl AuthContext {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthContext::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn require(&self) -> Result<&AuthUser, ApiError> {
        match self {
            AuthContext::Authenticated(user) => Ok(user),
            AuthContext::Anonymous => Err(ApiError::unauthorized("Authorization required")),
            AuthContext::Invalid(msg) => Err(ApiError::unauthorized(msg.clone())),
        }
    }
}

/// Resolves the Authorization header into an `AuthContext` request extension.
/// Never rejects by itself: whether anonymous access is acceptable is the
/// handler's decision.
pub async fn auth_context(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let context = match extract_bearer(&headers) {
        None => AuthContext::Anonymous,
        Some(token) => match validate_jwt(&token) {
            Ok(claims) => AuthContext::Authenticated(AuthUser::from(claims)),
            Err(msg) => AuthContext::Invalid(msg),
        },
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?
        .to_str()
        .ok()?;

    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_rejects_require() {
        let err = AuthContext::Anonymous.require().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Authorization required");
    }

    #[test]
    fn invalid_context_reports_reason() {
        let ctx = AuthContext::Invalid("Invalid token: expired".into());
        let err = ctx.require().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert!(err.message().starts_with("Invalid token"));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcg==".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer   ".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);
    }
}
