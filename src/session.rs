//! Authenticated sessions
//!
//! A [`Session`] is passed explicitly into every pipeline call. Between HTTP requests
//! it travels as an HS256 JWT carrying the username, wallet id and address.

use crate::wallet::Account;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub account: Account,
}

impl Session {
    pub fn new(username: impl Into<String>, account: Account) -> Self {
        Self {
            username: username.into(),
            account,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    wallet_id: String,
    address: String,
    iat: i64,
    exp: i64,
}

/// Issue a bearer token for `session`, valid for `ttl_secs`
pub fn issue_token(session: &Session, secret: &str, ttl_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: session.username.clone(),
        wallet_id: session.account.wallet_id.clone(),
        address: session.account.address.clone(),
        iat: now,
        exp: now + ttl_secs,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verify signature and expiry, then rebuild the session
pub fn verify_token(token: &str, secret: &str) -> Result<Session, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    let claims = data.claims;
    Ok(Session {
        username: claims.sub,
        account: Account {
            wallet_id: claims.wallet_id,
            address: claims.address,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "alice",
            Account {
                wallet_id: "w1".to_string(),
                address: "0x0263fd91c595ed132686147abb8fe8b39564b72b".to_string(),
            },
        )
    }

    #[test]
    fn test_token_verifies_with_same_secret() {
        let token = issue_token(&session(), "secret", 3600).unwrap();
        assert_eq!(verify_token(&token, "secret").unwrap(), session());
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let token = issue_token(&session(), "secret", 3600).unwrap();
        assert!(verify_token(&token, "another").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // default validation allows 60s of leeway
        let token = issue_token(&session(), "secret", -120).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
