//! JWT access/refresh token issuance and verification.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessToken, TokenClaims, TokenPair, TokenType, UserId},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

/// Token lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_lifetime: Duration::minutes(5),
            refresh_lifetime: Duration::days(1),
        }
    }
}

/// Signs and verifies HS256 tokens.
///
/// Access and refresh tokens share one claim set and are told apart by the
/// `token_type` claim; a refresh token is never accepted where an access
/// token is expected and vice versa.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: TokenConfig,
}

impl TokenIssuer {
    pub fn new(secret: &str, config: TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            config,
        }
    }

    /// Issue a fresh access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: UserId) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access: self.sign(user_id, TokenType::Access, self.config.access_lifetime)?,
            refresh: self.sign(user_id, TokenType::Refresh, self.config.refresh_lifetime)?,
        })
    }

    /// Mint a new access token from a valid refresh token.
    ///
    /// The refresh token itself is not rotated.
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<AccessToken> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;
        Ok(AccessToken {
            access: self.sign(claims.user_id, TokenType::Access, self.config.access_lifetime)?,
        })
    }

    /// Decode `token` and check its signature, expiry and type.
    pub fn verify(&self, token: &str, expected: TokenType) -> AuthResult<TokenClaims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;

        if claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    fn sign(&self, user_id: UserId, token_type: TokenType, lifetime: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}
