//! API Key authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity, Role};

/// Authenticator that validates requests against configured API keys.
///
/// The admin key grants [`Role::Admin`]; viewer keys grant [`Role::Viewer`].
///
/// Accepts the key in either:
/// - `Authorization: Bearer <key>` header
/// - `X-API-Key: <key>` header
pub struct ApiKeyAuthenticator {
    admin_key: String,
    viewer_keys: Vec<String>,
}

impl ApiKeyAuthenticator {
    pub fn new(admin_key: String) -> Self {
        Self {
            admin_key,
            viewer_keys: Vec::new(),
        }
    }

    pub fn with_viewer_keys(mut self, keys: Vec<String>) -> Self {
        self.viewer_keys = keys.into_iter().filter(|k| !k.is_empty()).collect();
        self
    }

    /// Extract API key from request headers.
    /// Checks Authorization: Bearer and X-API-Key headers.
    fn extract_key(&self, request: &AuthRequest) -> Option<String> {
        if let Some(auth_header) = request.headers.get("authorization") {
            if let Some(key) = auth_header
                .strip_prefix("Bearer ")
                .or_else(|| auth_header.strip_prefix("bearer "))
            {
                return Some(key.trim().to_string());
            }
        }

        request.headers.get("x-api-key").cloned()
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided_key = self
            .extract_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(provided_key.as_bytes(), self.admin_key.as_bytes()) {
            return Ok(Identity::new("api_key_admin", "api_key", Role::Admin));
        }

        // Scan every key so timing doesn't reveal which slot matched
        let viewer_match = self
            .viewer_keys
            .iter()
            .enumerate()
            .fold(None, |found, (idx, key)| {
                if constant_time_eq(provided_key.as_bytes(), key.as_bytes()) {
                    Some(idx)
                } else {
                    found
                }
            });

        match viewer_match {
            Some(idx) => Ok(Identity::new(
                format!("api_key_viewer_{}", idx),
                "api_key",
                Role::Viewer,
            )),
            None => Err(AuthError::InvalidCredentials("Invalid API key".to_string())),
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
