use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::{Requester, Role};

use super::error::ServiceError;

/// JWT service for access token issuance and verification (HS256, shared secret).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(rename = "restaurantId")]
    pub restaurant_id: i64,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl From<AccessTokenClaims> for Requester {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            restaurant_id: claims.restaurant_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.signing_secret.expose_secret().as_bytes();

        tracing::info!("JWT service initialized with HS256 shared secret");

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        }
    }

    /// Sign an access token for the identity with an explicit lifetime.
    pub fn issue(
        &self,
        restaurant_id: i64,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            restaurant_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to encode access token: {}", e)))
    }

    /// Sign an access token with the configured lifetime.
    pub fn generate_access_token(
        &self,
        restaurant_id: i64,
        email: &str,
        role: Role,
    ) -> Result<String, ServiceError> {
        self.issue(
            restaurant_id,
            email,
            role,
            Duration::minutes(self.access_token_expiry_minutes),
        )
    }

    /// Validate signature, algorithm and expiry. Pure, no I/O.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                ServiceError::InvalidToken
            })
    }

    /// Get access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service() -> JwtService {
        JwtService::new(&JwtConfig {
            signing_secret: Secret::new("unit-test-signing-secret-0123456789".to_string()),
            access_token_expiry_minutes: 15,
        })
    }

    #[test]
    fn test_access_token_generation_and_validation() -> Result<(), anyhow::Error> {
        let jwt = service();
        let token = jwt.generate_access_token(1, "a@x.com", Role::Owner)?;
        let claims = jwt.verify(&token)?;

        assert_eq!(claims.restaurant_id, 1);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Owner);
        let ttl = claims.exp - claims.iat;
        assert_eq!(ttl, 15 * 60);
        Ok(())
    }

    #[test]
    fn claims_use_camel_case_restaurant_id() -> Result<(), anyhow::Error> {
        let claims = AccessTokenClaims {
            restaurant_id: 7,
            email: "a@x.com".to_string(),
            role: Role::Chef,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims)?;
        assert_eq!(json["restaurantId"], 7);
        assert_eq!(json["role"], "chef");
        Ok(())
    }

    #[test]
    fn rejects_expired_token() -> Result<(), anyhow::Error> {
        let jwt = service();
        let token = jwt.issue(1, "a@x.com", Role::Chef, Duration::minutes(-1))?;
        assert!(matches!(jwt.verify(&token), Err(ServiceError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn rejects_token_signed_with_other_secret() -> Result<(), anyhow::Error> {
        let other = JwtService::new(&JwtConfig {
            signing_secret: Secret::new("another-secret-entirely-9876543210".to_string()),
            access_token_expiry_minutes: 15,
        });
        let token = other.generate_access_token(1, "a@x.com", Role::Owner)?;
        assert!(matches!(service().verify(&token), Err(ServiceError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn rejects_wrong_algorithm() -> Result<(), anyhow::Error> {
        let secret = "unit-test-signing-secret-0123456789";
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            restaurant_id: 1,
            email: "a@x.com".to_string(),
            role: Role::Owner,
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        assert!(matches!(service().verify(&token), Err(ServiceError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(matches!(
            service().verify("not-a-jwt"),
            Err(ServiceError::InvalidToken)
        ));
    }
}
