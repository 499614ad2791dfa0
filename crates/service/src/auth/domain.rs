use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Principal;
use crate::validation::ValidationErrors;

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.length("email", &self.email, 2, 128);
        errs.secret_length("password", &self.password, 5, 128);
        errs.into_result()
    }
}

/// Login result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub principal: Principal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_shape_rules() {
        let ok = LoginInput { email: "owner@acme.com".into(), password: "hunter22".into() };
        assert!(ok.validate().is_ok());

        let bad = LoginInput { email: "a".into(), password: "1234".into() };
        let errs = bad.validate().unwrap_err();
        assert!(errs.has("email"));
        assert!(errs.has("password"));

        let long = LoginInput { email: "owner@acme.com".into(), password: "p".repeat(129) };
        assert!(long.validate().unwrap_err().has("password"));

        let padded = LoginInput { email: "owner@acme.com".into(), password: "abcd ".into() };
        assert!(padded.validate().is_ok());
    }
}
