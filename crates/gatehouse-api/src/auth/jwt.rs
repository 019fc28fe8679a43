//! Credential token issuance and verification
//!
//! Tokens are HS256-signed JWTs carrying the user id (`sub`), issue time and
//! expiry. Verification is stateless: signature, issuer and expiry only.
//! [`TokenError`] keeps the failure reason for diagnostics; callers collapse
//! every variant into one client-facing rejection.

use gatehouse_core::{AuthConfig, UserId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};
use thiserror::Error;

/// JWT claims embedded in every credential token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// Token issuance and verification errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token claims")]
    InvalidClaims,

    #[error("System time error: {0}")]
    SystemTime(#[from] SystemTimeError),
}

impl TokenError {
    /// Short machine-readable reason for logs
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Encoding(_) => "encoding_failed",
            TokenError::Malformed => "malformed",
            TokenError::Expired => "expired",
            TokenError::InvalidSignature => "bad_signature",
            TokenError::InvalidClaims => "invalid_claims",
            TokenError::SystemTime(_) => "clock_error",
        }
    }
}

/// Signs and verifies credential tokens with a server-held secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
    issuer: String,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            issuer: issuer.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_secs, config.issuer.clone())
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for `user_id`, valid for the configured lifetime
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        self.issue_at(user_id, now)
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(&self, user_id: UserId, issued_at: u64) -> Result<String, TokenError> {
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify a token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidIssuer | ErrorKind::MissingRequiredClaim(_) => {
                    TokenError::InvalidClaims
                }
                _ => TokenError::Malformed,
            }
        })?;

        token_data
            .claims
            .sub
            .parse()
            .map_err(|_| TokenError::InvalidClaims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-key-with-enough-entropy", 86_400, "gatehouse")
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = issuer();
        let user_id = UserId::new();

        let token = tokens.issue(user_id).expect("Failed to issue token");
        assert_eq!(tokens.verify(&token).expect("Failed to verify"), user_id);
    }

    #[test]
    fn test_malformed_token() {
        let result = issuer().verify("invalid.token.here");
        assert!(matches!(result, Err(TokenError::Malformed)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenIssuer::new("secret1", 3600, "gatehouse")
            .issue(UserId::new())
            .unwrap();

        let result = TokenIssuer::new("secret2", 3600, "gatehouse").verify(&token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let token = TokenIssuer::new("secret", 3600, "someone-else")
            .issue(UserId::new())
            .unwrap();

        let result = TokenIssuer::new("secret", 3600, "gatehouse").verify(&token);
        assert!(matches!(result, Err(TokenError::InvalidClaims)));
    }

    #[test]
    fn test_expired_token() {
        let tokens = TokenIssuer::new("secret", 3600, "gatehouse");
        // Issued two hours ago with a one hour lifetime
        let token = tokens.issue_at(UserId::new(), now() - 7200).unwrap();

        let result = tokens.verify(&token);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let tokens = TokenIssuer::new("secret", 3600, "gatehouse");
        let user_id = UserId::new();
        // Issued 59 minutes ago, one minute of validity left
        let token = tokens.issue_at(user_id, now() - 3540).unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_huge_lifetime_does_not_wrap() {
        let tokens = TokenIssuer::new("secret", u64::MAX, "gatehouse");
        let user_id = UserId::new();

        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let claims = Claims {
            iss: "gatehouse".to_string(),
            sub: "not-a-user-id".to_string(),
            iat: now(),
            exp: now() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let result = TokenIssuer::new("secret", 3600, "gatehouse").verify(&token);
        assert!(matches!(result, Err(TokenError::InvalidClaims)));
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", issuer());
        assert!(!rendered.contains("test-secret-key"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_verify_inverts_issue(bytes in any::<[u8; 16]>()) {
            let tokens = issuer();
            let user_id = UserId::from(Uuid::from_bytes(bytes));
            let token = tokens.issue(user_id).unwrap();
            prop_assert_eq!(tokens.verify(&token).unwrap(), user_id);
        }
    }
}
