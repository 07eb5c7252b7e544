//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying only the user id. Role and profile data are
//! reloaded from the database on every request so that role changes and
//! deletions take effect immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfront_core::UserId;

/// Errors from token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, expiry, or structure check failed.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// The `sub` claim is not a user id.
    #[error("invalid token subject")]
    InvalidSubject,

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service signing with `secret`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for bad signatures, expired tokens and
    /// malformed input, `TokenError::InvalidSubject` if `sub` is not an id.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(TokenError::Invalid)?;

        data.claims
            .sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::InvalidSubject)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_owned()), 24)
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let token = tokens.issue(UserId::new(42)).unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_claims_carry_lifetime() {
        let tokens = service("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let token = tokens.issue(UserId::new(1)).unwrap();

        let claims = decode::<Claims>(&token, &tokens.decoding, &tokens.validation)
            .unwrap()
            .claims;
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        assert!(matches!(
            tokens.verify("invalid.token.here"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let issuer = service("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let verifier = service("Zq8!Lm3@Rt6#Vx1$Np4%Hk7^Bc2&Wd5*");
        let token = issuer.issue(UserId::new(7)).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let issued = Utc::now() - Duration::hours(48);
        let claims = Claims {
            sub: "3".to_owned(),
            iat: issued.timestamp(),
            exp: (issued + Duration::hours(24)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let tokens = service("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let now = Utc::now();
        let claims = Claims {
            sub: "not-a-number".to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();

        assert!(matches!(
            tokens.verify(&token),
            Err(TokenError::InvalidSubject)
        ));
    }
}
