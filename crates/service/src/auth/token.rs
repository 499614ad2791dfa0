use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Principal, User};
use crate::errors::DirectoryError;

/// Only HMAC tokens are ever accepted; anything else is an algorithm-confusion attempt.
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims as issued at login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Claims as received; `roles` is checked by hand so a malformed value is
/// rejected rather than silently dropped.
#[derive(Debug, Deserialize)]
struct ReceivedClaims {
    sub: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "present")]
    roles: Option<serde_json::Value>,
    exp: i64,
}

/// Keeps an explicit `null` distinguishable from an absent field.
fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(d).map(Some)
}

/// Signing and verification keys derived from the server secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], algorithm: &str, ttl: Duration) -> Result<Self, DirectoryError> {
        let algorithm = Algorithm::from_str(algorithm)
            .map_err(|e| DirectoryError::Internal(format!("unknown signing algorithm: {}", e)))?;
        if !HMAC_FAMILY.contains(&algorithm) {
            return Err(DirectoryError::Internal(format!("{:?} is not an HMAC algorithm", algorithm)));
        }
        if secret.is_empty() {
            return Err(DirectoryError::Internal("signing key is empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
        })
    }

    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), DirectoryError> {
        self.issue_at(user, Utc::now())
    }

    /// Sign a token as if issued at `now`; expiry is `now + ttl`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>), DirectoryError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| DirectoryError::Internal(format!("token signing failed: {}", e)))?;
        Ok((token, expires_at))
    }

    /// Check signature, algorithm family and expiry, then rebuild the principal.
    /// Every rejection is `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Principal, DirectoryError> {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<ReceivedClaims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            DirectoryError::Unauthorized
        })?;
        let claims = data.claims;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            debug!("token subject is not a uuid");
            DirectoryError::Unauthorized
        })?;
        let roles = normalize_roles(claims.roles)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(DirectoryError::Unauthorized)?;
        Ok(Principal { id, name: claims.name, roles, expires_at })
    }
}

/// Absent means no roles; present must be an array of strings.
fn normalize_roles(value: Option<serde_json::Value>) -> Result<Vec<String>, DirectoryError> {
    use serde_json::Value;
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => {
                    debug!("role claim holds a non-string element");
                    Err(DirectoryError::Unauthorized)
                }
            })
            .collect(),
        Some(_) => {
            debug!("role claim is not an array");
            Err(DirectoryError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"unit-test-signing-key-unit-test-signing-key";

    fn keys() -> TokenKeys {
        TokenKeys::new(SECRET, "HS256", Duration::hours(1)).unwrap()
    }

    fn user(roles: &[&str]) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "owner@acme.com".into(),
            name: "Ada Owner".into(),
            password_hash: "h".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sign_raw(claims: serde_json::Value, alg: Algorithm, secret: &[u8]) -> String {
        encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn issued_claims_round_trip() {
        let k = keys();
        let u = user(&["business", "admin"]);
        let (token, exp) = k.issue(&u).unwrap();
        let p = k.verify(&token).unwrap();
        assert_eq!(p.id, u.id);
        assert_eq!(p.name, "Ada Owner");
        assert_eq!(p.roles, vec!["business", "admin"]);
        assert_eq!(p.expires_at.timestamp(), exp.timestamp());
    }

    #[test]
    fn expired_token_rejected_despite_valid_signature() {
        let k = keys();
        let (token, _) = k.issue_at(&user(&["business"]), Utc::now() - Duration::hours(2)).unwrap();
        assert!(matches!(k.verify(&token), Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn wrong_secret_rejected() {
        let other = TokenKeys::new(b"another-secret-another-secret", "HS256", Duration::hours(1)).unwrap();
        let (token, _) = other.issue(&user(&[])).unwrap();
        assert!(matches!(keys().verify(&token), Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn other_hmac_strengths_are_accepted() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let id = Uuid::new_v4();
        let token = sign_raw(json!({"sub": id.to_string(), "name": "n", "roles": ["x"], "exp": exp}), Algorithm::HS512, SECRET);
        assert_eq!(keys().verify(&token).unwrap().id, id);
    }

    #[test]
    fn unsigned_token_rejected() {
        // {"alg":"none","typ":"JWT"}
        const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let (token, _) = keys().issue(&user(&["admin"])).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let forged = format!("{}.{}.", NONE_HEADER, payload);
        assert!(matches!(keys().verify(&forged), Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn tampered_payload_rejected() {
        let k = keys();
        let (token, _) = k.issue(&user(&[])).unwrap();
        let (other, _) = k.issue(&user(&["admin"])).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other.split('.').nth(1).unwrap(), parts[2]);
        assert!(matches!(k.verify(&forged), Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn malformed_roles_rejected() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let sub = Uuid::new_v4().to_string();
        for roles in [json!("admin"), json!(["admin", 7]), json!({"admin": true}), json!(null)] {
            let token = sign_raw(json!({"sub": sub, "name": "n", "roles": roles, "exp": exp}), Algorithm::HS256, SECRET);
            assert!(matches!(keys().verify(&token), Err(DirectoryError::Unauthorized)), "roles={}", roles);
        }
    }

    #[test]
    fn missing_roles_means_no_roles() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign_raw(json!({"sub": Uuid::new_v4().to_string(), "name": "n", "exp": exp}), Algorithm::HS256, SECRET);
        assert!(keys().verify(&token).unwrap().roles.is_empty());
    }

    #[test]
    fn non_uuid_subject_rejected() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign_raw(json!({"sub": "owner@acme.com", "exp": exp}), Algorithm::HS256, SECRET);
        assert!(matches!(keys().verify(&token), Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn missing_exp_rejected() {
        let token = sign_raw(json!({"sub": Uuid::new_v4().to_string()}), Algorithm::HS256, SECRET);
        assert!(matches!(keys().verify(&token), Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn non_hmac_configuration_refused() {
        assert!(TokenKeys::new(SECRET, "RS256", Duration::hours(1)).is_err());
        assert!(TokenKeys::new(b"", "HS256", Duration::hours(1)).is_err());
    }
}
