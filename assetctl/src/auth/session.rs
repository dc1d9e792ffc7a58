//! Bearer token creation and verification.
//!
//! Tokens carry `{userId, isAdmin, companyId}` plus an issued-at stamp and are signed with the
//! configured `secret_key` (HS256). They do not expire: a token stays valid until the key rotates,
//! and revocation is handled by the identity resolver refusing inactive users.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::{
    auth::identity::Identity,
    config::Config,
    db::handlers::Admins,
    errors::Error,
    types::{CompanyId, UserId},
};

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: UserId,
    pub is_admin: bool,
    pub company_id: CompanyId,
    pub iat: i64, // Issued at
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            company_id: claims.company_id,
            is_admin: claims.is_admin,
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign tokens: secret_key is required".to_string(),
    })
}

/// Sign a token for an identity whose admin flag has already been resolved server-side.
pub fn create_token(identity: &Identity, config: &Config) -> Result<String, Error> {
    let claims = TokenClaims {
        user_id: identity.user_id,
        is_admin: identity.is_admin,
        company_id: identity.company_id,
        iat: Utc::now().timestamp(),
    };

    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Issue a token for a stored user. The admin flag comes from the admin relation, never from the
/// caller.
pub async fn issue_for_user(conn: &mut PgConnection, user_id: UserId, company_id: CompanyId, config: &Config) -> Result<String, Error> {
    let is_admin = Admins::new(conn).is_admin(user_id).await?;
    create_token(
        &Identity {
            user_id,
            company_id,
            is_admin,
        },
        config,
    )
}

/// Verify and decode a token. Only the signature and claim shape are checked.
pub fn verify_token(token: &str, config: &Config) -> Result<Identity, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let mut validation = Validation::default();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;

    let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, bad signatures, wrong claim shapes
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => Error::unauthorized(),

        // Key issues and anything else are server-side
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(Identity::from(token_data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        }
    }

    fn identity() -> Identity {
        Identity {
            user_id: 7,
            company_id: 3,
            is_admin: true,
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let config = create_test_config();
        let token = create_token(&identity(), &config).unwrap();
        assert!(!token.is_empty());

        let verified = verify_token(&token, &config).unwrap();
        assert_eq!(verified, identity());
    }

    #[test]
    fn test_claims_are_camel_case_without_expiry() {
        let config = create_test_config();
        let token = create_token(&identity(), &config).unwrap();

        let mut validation = Validation::default();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let key = DecodingKey::from_secret(b"test-secret-key-for-jwt");
        let raw = decode::<serde_json::Value>(&token, &key, &validation).unwrap().claims;

        assert_eq!(raw["userId"], 7);
        assert_eq!(raw["companyId"], 3);
        assert_eq!(raw["isAdmin"], true);
        assert!(raw.get("exp").is_none());
    }

    #[test]
    fn test_old_token_still_verifies() {
        let config = create_test_config();
        let claims = TokenClaims {
            user_id: 1,
            is_admin: false,
            company_id: 1,
            iat: (Utc::now() - chrono::Duration::days(3650)).timestamp(),
        };
        let key = EncodingKey::from_secret(b"test-secret-key-for-jwt");
        let token = encode(&Header::default(), &claims, &key).unwrap();

        assert!(verify_token(&token, &config).is_ok());
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let token = create_token(&identity(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_token(token, &config);
            assert!(
                matches!(result, Err(Error::Unauthenticated { .. })),
                "Expected Unauthenticated error for token: {token}"
            );
        }
    }

    #[test]
    fn test_token_with_foreign_claims_is_rejected() {
        let config = create_test_config();
        let key = EncodingKey::from_secret(b"test-secret-key-for-jwt");
        let token = encode(&Header::default(), &serde_json::json!({ "sub": "someone" }), &key).unwrap();

        assert!(matches!(verify_token(&token, &config), Err(Error::Unauthenticated { .. })));
    }
}
