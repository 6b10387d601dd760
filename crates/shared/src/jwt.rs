//! JWT validation (and issuance for development tooling).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, Realm};

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token belongs to the other realm.
    #[error("token realm mismatch")]
    WrongRealm,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    leeway_secs: u64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service from a shared secret.
    #[must_use]
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway_secs,
        }
    }

    /// Signs arbitrary claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Issues an internal-realm token valid for `hours`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn issue_internal(
        &self,
        user_id: Uuid,
        role: &str,
        department: Option<String>,
        hours: i64,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::hours(hours);
        self.sign(&Claims::internal(user_id, role, department, expires_at))
    }

    /// Issues a vendor-realm token valid for `hours`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn issue_vendor(&self, vendor_id: Uuid, hours: i64) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::hours(hours);
        self.sign(&Claims::vendor(vendor_id, expires_at))
    }

    /// Validates a token and checks it belongs to `realm`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired,
    /// `JwtError::WrongRealm` for a token of the other realm, and
    /// `JwtError::DecodingError` if the token is malformed.
    pub fn validate(&self, token: &str, realm: Realm) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.leeway = self.leeway_secs;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.realm != realm {
            return Err(JwtError::WrongRealm);
        }
        Ok(claims)
    }
}
