use std::sync::OnceLock;

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User ID
    pub role: String,
    pub permissions: Vec<String>,
    pub exp: usize, // Expiration timestamp
}

static JWT_SECRET: OnceLock<Vec<u8>> = OnceLock::new();

/// Install the signing secret from config. Called once at startup,
/// before the router starts serving.
pub fn init(secret: &str) {
    let _ = JWT_SECRET.set(secret.as_bytes().to_vec());
}

fn secret() -> &'static [u8] {
    JWT_SECRET.get().map(Vec::as_slice).unwrap_or(b"")
}

/// Sign a new JWT token for a user.
pub fn sign(user_id: i32, username: &str, role: &str, permissions: Vec<String>) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        role: role.to_owned(),
        permissions,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
