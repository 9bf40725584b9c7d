use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;

static JWT_SECRET: OnceCell<String> = OnceCell::new();

/// Set the HS256 secret once at startup (from `[auth] jwt_secret`)
pub fn init_secret(secret: &str) -> Result<()> {
    JWT_SECRET
        .set(secret.to_string())
        .map_err(|_| anyhow::anyhow!("JWT secret already initialized"))
}

fn secret() -> Result<&'static str> {
    JWT_SECRET
        .get()
        .map(String::as_str)
        .context("JWT secret is not initialized")
}

/// Выпуск токена (24 часа). Токены выдаёт внешний сервис идентификации;
/// здесь это нужно только для демо-данных и тестов.
pub fn generate_access_token_with(
    secret: &str,
    user_id: &str,
    username: &str,
    is_admin: bool,
) -> Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        is_admin,
        exp: (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

/// Validate JWT token and extract claims
pub fn validate_token_with(token: &str, secret: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

pub fn validate_token(token: &str) -> Result<TokenClaims> {
    validate_token_with(token, secret()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_and_wrong_secret() {
        let token = generate_access_token_with("s1", "u1", "alice", true).unwrap();
        let claims = validate_token_with(&token, "s1").unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);

        assert!(validate_token_with(&token, "s2").is_err());
        assert!(validate_token_with("garbage", "s1").is_err());
    }
}
