//! Access tokens.
//!
//! Tokens are HS256 JWTs carrying the account id and login. They are issued on registration and login, returned in the
//! `Authorization` response header, and must be presented as `Authorization: Bearer <token>` on every `/api/user`
//! route except registration and login.
use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use loyalty_engine::db_types::AccountId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The account id
    pub sub: AccountId,
    pub login: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime: config.token_lifetime,
        }
    }

    /// Issue a new access token for the given account.
    /// This method DOES NOT check the account's credentials. That must be done prior to calling `issue_token`.
    pub fn issue_token(&self, account_id: AccountId, login: &str) -> Result<String, ServerError> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = JwtClaims { sub: account_id, login: login.to_string(), iat: now, exp: now.saturating_add(lifetime) };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    /// Checks the signature and expiry of `token` and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidToken | jsonwebtoken::errors::ErrorKind::Base64(_) => {
                    AuthError::PoorlyFormattedToken(e.to_string())
                },
                _ => AuthError::ValidationError(e.to_string()),
            })
    }

    /// The value for the `Authorization` header that carries `token`.
    pub fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }
}

/// The authenticated caller. Add it as a handler argument to require a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub login: String,
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self { account_id: claims.sub, login: claims.login }
    }
}

impl FromRequest for Principal {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_principal(req))
    }
}

fn extract_principal(req: &HttpRequest) -> Result<Principal, ServerError> {
    let issuer = req.app_data::<web::Data<TokenIssuer>>().ok_or_else(|| {
        ServerError::ConfigurationError("No token issuer has been registered with the application".into())
    })?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let header = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))?;
    let claims = issuer.validate_token(token).map_err(|e| {
        debug!("🔑️ Rejected access token. {e}");
        e
    })?;
    trace!("🔑️ Request authenticated for {} ({})", claims.login, claims.sub);
    Ok(claims.into())
}
