use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::Config;

pub mod api;

/// Represents the currently authenticated user.
///
/// Inserted as a request extension by the authentication middleware and
/// passed explicitly to handlers that need the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Authentication state containing the JWT secret shared with the token issuer.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,   // Expiry time of the token
    pub iat: usize,   // Issued at time of the token
    pub user_id: i64, // ID of the authenticated user
}

/// Issues a token for `user_id` that is valid for 24 hours.
pub fn encode_jwt(user_id: i64, jwt_secret: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims { exp, iat, user_id };
    let jwt = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_round_trip_user_id_through_jwt() {
        let token = encode_jwt(7, "test_secret").unwrap();

        let claims = decode_jwt(&token, "test_secret").unwrap();

        assert_eq!(claims.user_id, 7);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let token = encode_jwt(7, "test_secret").unwrap();

        assert!(decode_jwt(&token, "other_secret").is_err());
    }
}
