//! Bearer token issuance and verification.
//!
//! Tokens are HS256-signed JWTs. A login yields an access/refresh pair; the refresh token can
//! only be exchanged for a new access token, and only access tokens authenticate requests.
//! Tokens carry the identity id and display fields, never the administrative flag: callers
//! re-read that from the identity store on every request.

use caremap_core::config::positive_u64_from_env_value;
use caremap_core::{CareError, Identity};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Minimum accepted signing secret length, in bytes.
pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_ACCESS_TOKEN_MINUTES: u64 = 5;
pub const DEFAULT_REFRESH_TOKEN_HOURS: u64 = 24;
/// One year, in minutes.
pub const MAX_ACCESS_TOKEN_MINUTES: u64 = 525_600;
/// One year, in hours.
pub const MAX_REFRESH_TOKEN_HOURS: u64 = 8_760;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
    #[error("expected a {expected} token")]
    WrongType { expected: TokenType },
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error(transparent)]
    Config(#[from] CareError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id.
    pub sub: String,
    pub username: String,
    /// The identity's first name.
    pub name: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token lifetimes and signing secret, resolved once at startup.
#[derive(Clone)]
pub struct TokenSettings {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenSettings {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret);
        }
        Ok(Self {
            secret,
            access_ttl,
            refresh_ttl,
        })
    }

    /// Builds settings from raw environment values.
    ///
    /// The secret is required; lifetimes fall back to 5 minutes and 24 hours. A lifetime longer
    /// than a year is a configuration error.
    pub fn from_env_values(
        secret: Option<String>,
        access_minutes: Option<String>,
        refresh_hours: Option<String>,
    ) -> Result<Self, TokenError> {
        let secret = secret
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                CareError::InvalidConfig("CAREMAP_JWT_SECRET must be set".into())
            })?;
        let access_minutes = positive_u64_from_env_value(
            "CAREMAP_ACCESS_TOKEN_MINUTES",
            access_minutes,
            DEFAULT_ACCESS_TOKEN_MINUTES,
        )?;
        let refresh_hours = positive_u64_from_env_value(
            "CAREMAP_REFRESH_TOKEN_HOURS",
            refresh_hours,
            DEFAULT_REFRESH_TOKEN_HOURS,
        )?;

        let access_minutes = at_most(
            "CAREMAP_ACCESS_TOKEN_MINUTES",
            access_minutes,
            MAX_ACCESS_TOKEN_MINUTES,
        )?;
        let refresh_hours = at_most(
            "CAREMAP_REFRESH_TOKEN_HOURS",
            refresh_hours,
            MAX_REFRESH_TOKEN_HOURS,
        )?;

        Self::new(
            secret,
            Duration::minutes(access_minutes),
            Duration::hours(refresh_hours),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

fn at_most(name: &str, value: u64, max: u64) -> Result<i64, CareError> {
    if value > max {
        return Err(CareError::InvalidConfig(format!(
            "{name} must be at most {max}, got {value}"
        )));
    }
    i64::try_from(value)
        .map_err(|_| CareError::InvalidConfig(format!("{name} is out of range")))
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&settings.secret),
            decoding: DecodingKey::from_secret(&settings.secret),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        }
    }

    /// Issues a fresh access/refresh pair for an authenticated identity.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let sub = identity.id.to_string();
        let access = self.issue(
            &sub,
            &identity.username,
            &identity.first_name,
            TokenType::Access,
        )?;
        let refresh = self.issue(
            &sub,
            &identity.username,
            &identity.first_name,
            TokenType::Refresh,
        )?;
        Ok(TokenPair { access, refresh })
    }

    /// Exchanges a valid refresh token for a new access token.
    ///
    /// Returns the new token together with the refresh token's claims.
    pub fn refresh(&self, refresh_token: &str) -> Result<(String, Claims), TokenError> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;
        let access = self.issue(&claims.sub, &claims.username, &claims.name, TokenType::Access)?;
        Ok((access, claims))
    }

    /// Verifies an access token presented as a bearer credential.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenType::Access)
    }

    fn issue(
        &self,
        sub: &str,
        username: &str,
        name: &str,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            name: name.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    tracing::debug!("token rejected: {e}");
                    TokenError::Invalid
                }
            }
        })?;

        if data.claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caremap_core::RecordId;

    const SECRET: &str = "an-adequately-long-test-signing-secret";

    fn service() -> TokenService {
        let settings =
            TokenSettings::new(SECRET, Duration::minutes(5), Duration::hours(24)).unwrap();
        TokenService::new(&settings)
    }

    fn identity() -> Identity {
        Identity {
            id: RecordId::new(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_carries_identity_claims() {
        let svc = service();
        let who = identity();
        let pair = svc.issue_pair(&who).unwrap();

        let claims = svc.verify_access(&pair.access).unwrap();
        assert_eq!(claims.sub, who.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let svc = service();
        let pair = svc.issue_pair(&identity()).unwrap();

        assert!(matches!(
            svc.verify_access(&pair.refresh),
            Err(TokenError::WrongType {
                expected: TokenType::Access
            })
        ));
    }

    #[test]
    fn refresh_issues_new_access_token() {
        let svc = service();
        let who = identity();
        let pair = svc.issue_pair(&who).unwrap();

        let (access, claims) = svc.refresh(&pair.refresh).unwrap();
        assert_eq!(claims.sub, who.id.to_string());
        assert_eq!(svc.verify_access(&access).unwrap().sub, who.id.to_string());
    }

    #[test]
    fn refresh_rejects_access_token() {
        let svc = service();
        let pair = svc.issue_pair(&identity()).unwrap();

        assert!(matches!(
            svc.refresh(&pair.access),
            Err(TokenError::WrongType {
                expected: TokenType::Refresh
            })
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: RecordId::new().to_string(),
            username: "alice".into(),
            name: "Alice".into(),
            token_type: TokenType::Access,
            iat: now - 600,
            exp: now - 300,
            jti: "expired".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(svc.verify_access(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = TokenService::new(
            &TokenSettings::new(
                "a-completely-different-signing-secret!!",
                Duration::minutes(5),
                Duration::hours(24),
            )
            .unwrap(),
        );
        let pair = other.issue_pair(&identity()).unwrap();

        assert!(matches!(
            service().verify_access(&pair.access),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            service().verify_access("not-a-jwt"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            TokenSettings::new("short", Duration::minutes(5), Duration::hours(24)),
            Err(TokenError::WeakSecret)
        ));
    }

    #[test]
    fn settings_from_env_values() {
        let settings =
            TokenSettings::from_env_values(Some(SECRET.into()), None, Some("48".into())).unwrap();
        assert_eq!(settings.access_ttl(), Duration::minutes(5));
        assert_eq!(settings.refresh_ttl(), Duration::hours(48));

        assert!(matches!(
            TokenSettings::from_env_values(None, None, None),
            Err(TokenError::Config(CareError::InvalidConfig(_)))
        ));
        assert!(matches!(
            TokenSettings::from_env_values(Some(SECRET.into()), Some("0".into()), None),
            Err(TokenError::Config(CareError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn lifetimes_longer_than_a_year_are_rejected() {
        let at_limit = TokenSettings::from_env_values(
            Some(SECRET.into()),
            Some(MAX_ACCESS_TOKEN_MINUTES.to_string()),
            Some(MAX_REFRESH_TOKEN_HOURS.to_string()),
        )
        .unwrap();
        assert_eq!(at_limit.access_ttl(), Duration::days(365));
        assert_eq!(at_limit.refresh_ttl(), Duration::days(365));

        match TokenSettings::from_env_values(Some(SECRET.into()), Some("525601".into()), None) {
            Err(TokenError::Config(CareError::InvalidConfig(msg))) => {
                assert!(msg.contains("CAREMAP_ACCESS_TOKEN_MINUTES"));
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
        assert!(matches!(
            TokenSettings::from_env_values(
                Some(SECRET.into()),
                None,
                Some(u64::MAX.to_string())
            ),
            Err(TokenError::Config(CareError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn tokens_have_unique_ids() {
        let svc = service();
        let who = identity();
        let a = svc.verify_access(&svc.issue_pair(&who).unwrap().access).unwrap();
        let b = svc.verify_access(&svc.issue_pair(&who).unwrap().access).unwrap();
        assert_ne!(a.jti, b.jti);
    }
}
