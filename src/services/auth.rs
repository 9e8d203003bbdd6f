use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims issued by the marketplace auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Marketplace user id
    pub sub: String,
    pub exp: usize,
}

/// Verifies optional bearer tokens.
///
/// Personalization is best-effort: a missing, malformed, or expired token
/// yields None and the request proceeds unpersonalized.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Extract the user id from an `Authorization` header value, if valid
    pub fn user_id_from_header(&self, header: Option<&str>) -> Option<String> {
        let header = header?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))?
            .trim();

        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                None
            }
        }
    }
}
