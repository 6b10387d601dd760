//! Authentication middleware for protected routes.
//!
//! Internal users and vendors carry bearer tokens from different realms. The
//! middleware verifies the token for its realm and stores the resulting
//! actor in request extensions; handlers read it back through [`AuthUser`]
//! or [`AuthVendor`].

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, header::USER_AGENT, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use procura_core::policy::{Actor, ActorMetadata, Role, VendorActor};
use procura_shared::auth::{Claims, Realm};
use procura_shared::jwt::JwtError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn reject(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

fn verify(state: &AppState, headers: &HeaderMap, realm: Realm) -> Result<Claims, Response> {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
    else {
        return Err(reject(
            "UNAUTHORIZED",
            "Authorization header with Bearer token is required",
        ));
    };

    state
        .jwt_service
        .validate(token, realm)
        .map_err(|e| match e {
            JwtError::Expired => reject("UNAUTHORIZED", "Token has expired"),
            JwtError::WrongRealm => reject("UNAUTHORIZED", "Token was issued for another realm"),
            _ => reject("UNAUTHORIZED", "Invalid or malformed token"),
        })
}

fn metadata(headers: &HeaderMap) -> ActorMetadata {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    };
    ActorMetadata {
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string())),
        user_agent: header(USER_AGENT.as_str()),
    }
}

/// Validates an internal-realm token and stores the [`Actor`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match verify(&state, request.headers(), Realm::Internal) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    let Some(role) = Role::parse(&claims.role) else {
        return reject("UNAUTHORIZED", "Token carries an unknown role");
    };

    let mut actor = Actor::new(claims.subject(), role);
    actor.department = claims.department;
    actor.metadata = metadata(request.headers());
    request.extensions_mut().insert(actor);
    next.run(request).await
}

/// Validates a vendor-realm token and stores the [`VendorActor`].
pub async fn vendor_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match verify(&state, request.headers(), Realm::Vendor) {
        Ok(claims) => {
            request.extensions_mut().insert(VendorActor {
                vendor_id: claims.subject(),
            });
            next.run(request).await
        }
        Err(response) => response,
    }
}

/// Extractor for the authenticated internal user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| reject("UNAUTHORIZED", "Authentication required"))
    }
}

/// Extractor for the authenticated vendor account.
#[derive(Debug, Clone, Copy)]
pub struct AuthVendor(pub VendorActor);

impl<S> FromRequestParts<S> for AuthVendor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VendorActor>()
            .copied()
            .map(AuthVendor)
            .ok_or_else(|| reject("UNAUTHORIZED", "Vendor authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_metadata_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));
        let meta = metadata(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.5"));
    }
}
