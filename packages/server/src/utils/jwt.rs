use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    /// Username at signing time; display only, the account row is the
    /// source of truth.
    pub name: String,
    /// Expiration timestamp.
    pub exp: usize,
}

/// Sign a new session token for an account.
pub fn sign(account_id: &str, username: &str, secret: &str, days: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: account_id.to_owned(),
        name: username.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
