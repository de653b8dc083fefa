use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

/// Identity extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Stable subject identifier; the ledger account id.
    pub sub: String,
    pub email: Option<String>,
    /// Display name from the identity provider.
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("JWKS fetch error: {0}")]
    JwksFetchError(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
}

#[derive(Debug, Deserialize)]
struct OidcConfig {
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

/// ID token claims we care about.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Verifies Bearer tokens against the issuer's JWKS, caching decoding keys.
///
/// Created once at startup and shared through [`crate::AppState`]; never
/// re-initialized per request.
pub struct JwksClient {
    http_client: Client,
    jwks_uri: String,
    keys: Arc<RwLock<HashMap<String, DecodingKey>>>,
    issuer: String,
    audience: String,
}

impl JwksClient {
    pub async fn new(issuer: &str, audience: &str) -> Result<Self, AuthError> {
        let http_client = Client::new();

        let config_url =
            format!("{}/.well-known/openid-configuration", issuer.trim_end_matches('/'));
        let config: OidcConfig = http_client
            .get(&config_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let client = Self {
            http_client,
            jwks_uri: config.jwks_uri,
            keys: Arc::new(RwLock::new(HashMap::new())),
            issuer: issuer.trim_end_matches('/').to_string(),
            audience: audience.to_string(),
        };

        client.refresh_keys().await?;

        Ok(client)
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();

        for jwk in response.keys {
            if jwk.kty == "RSA" {
                if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            keys.insert(jwk.kid.clone(), key);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", keys.len());
        Ok(())
    }

    /// Authenticate a request by validating its Bearer token.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let auth_header = headers
            .get("authorization")
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        let header =
            decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Missing kid in token header".to_string()))?;

        let keys = self.keys.read().await;
        let key = keys.get(&kid).ok_or_else(|| AuthError::KeyNotFound(kid.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(token, key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AuthUser {
            sub: token_data.claims.sub,
            email: token_data.claims.email,
            name: token_data.claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn headers_with_auth(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token.parse().unwrap());
        headers
    }

    #[test]
    fn test_auth_user_fields() {
        let user = AuthUser {
            sub: "firebase|abc123".to_string(),
            email: Some("ibu.sari@example.com".to_string()),
            name: Some("Ibu Sari".to_string()),
        };
        assert_eq!(user.sub, "firebase|abc123");
        assert_eq!(user.email.as_deref(), Some("ibu.sari@example.com"));
        assert_eq!(user.name.as_deref(), Some("Ibu Sari"));
    }

    #[test]
    fn test_auth_user_without_optional_claims() {
        let user = AuthUser { sub: "u1".to_string(), email: None, name: None };
        assert!(user.email.is_none());
        assert!(user.name.is_none());
    }

    #[test]
    fn test_auth_user_clone() {
        let original = AuthUser {
            sub: "u1".to_string(),
            email: Some("a@b.c".to_string()),
            name: None,
        };
        let cloned = original.clone();
        assert_eq!(cloned.sub, original.sub);
        assert_eq!(cloned.email, original.email);
    }

    #[test]
    fn test_error_display_messages() {
        assert_eq!(AuthError::MissingHeader.to_string(), "Missing Authorization header");
        assert_eq!(
            AuthError::InvalidFormat.to_string(),
            "Invalid Authorization header format"
        );
        assert!(AuthError::InvalidToken("expired".to_string())
            .to_string()
            .contains("Invalid token"));
        assert!(AuthError::JwksFetchError("connection refused".to_string())
            .to_string()
            .contains("JWKS fetch error"));
        assert!(AuthError::KeyNotFound("kid123".to_string())
            .to_string()
            .contains("kid123"));
    }

    #[test]
    fn test_bearer_prefix_detection() {
        let headers = headers_with_auth("Bearer eyJhbGciOiJSUzI1NiJ9.x.y");
        let value = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap();
        assert!(value.strip_prefix("Bearer ").is_some());

        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        let value = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap();
        assert!(value.strip_prefix("Bearer ").is_none());
    }

    #[test]
    fn test_claims_deserialize_with_missing_optionals() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"u1"}"#).unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.email.is_none());
        assert!(claims.name.is_none());
    }
}
