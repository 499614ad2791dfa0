use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// Registration request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBusinessInput {
    pub business_name: String,
    #[serde(default)]
    pub website: String,
    pub owner_full_name: String,
    #[serde(default)]
    pub owner_job_title: String,
    pub work_email: String,
    #[serde(default)]
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub description: String,
}

impl RegisterBusinessInput {
    /// Check every field and report all violations together.
    pub fn validate(&self, min_password_length: usize) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.length("businessName", &self.business_name, 2, 128);
        errs.length("ownerFullName", &self.owner_full_name, 5, 128);
        errs.length("workEmail", &self.work_email, 7, 128);
        errs.email("workEmail", &self.work_email);
        errs.secret_length("password", &self.password, min_password_length, 128);
        if self.confirm_password != self.password {
            errs.add("confirmPassword", "must match password");
        }
        errs.max_length("website", &self.website, 255);
        errs.optional_url("website", &self.website);
        errs.max_length("ownerJobTitle", &self.owner_job_title, 128);
        errs.max_length("phoneNumber", &self.phone_number, 64);
        errs.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegisterBusinessInput {
        RegisterBusinessInput {
            business_name: "Acme Bakery".into(),
            website: "https://acme.example".into(),
            owner_full_name: "Ada Lovelace".into(),
            owner_job_title: "Founder".into(),
            work_email: "ada@acme.example".into(),
            phone_number: "+1 555 0100".into(),
            password: "Passw0rd!".into(),
            confirm_password: "Passw0rd!".into(),
            category_id: None,
            description: "Bread".into(),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(valid().validate(8).is_ok());
    }

    #[test]
    fn lists_every_bad_field() {
        let input = RegisterBusinessInput {
            business_name: " ".into(),
            owner_full_name: "Al".into(),
            work_email: "not-an-email".into(),
            password: "short".into(),
            confirm_password: "different".into(),
            website: "javascript:alert(1)".into(),
            ..valid()
        };
        let errs = input.validate(8).unwrap_err();
        for f in ["businessName", "ownerFullName", "workEmail", "password", "confirmPassword", "website"] {
            assert!(errs.has(f), "missing {}", f);
        }
    }

    #[test]
    fn minimum_password_length_is_configurable() {
        let input = RegisterBusinessInput {
            password: "abcdefghij".into(),
            confirm_password: "abcdefghij".into(),
            ..valid()
        };
        assert!(input.validate(10).is_ok());
        assert!(input.validate(12).unwrap_err().has("password"));
    }

    #[test]
    fn password_whitespace_counts_toward_length() {
        let input = RegisterBusinessInput {
            password: "abcdefg ".into(),
            confirm_password: "abcdefg ".into(),
            ..valid()
        };
        assert!(input.validate(8).is_ok());
    }

    #[test]
    fn optional_fields_are_bounded_by_column_width() {
        let input = RegisterBusinessInput {
            phone_number: "5".repeat(500),
            owner_job_title: "t".repeat(500),
            website: format!("https://acme.example/{}", "p".repeat(300)),
            ..valid()
        };
        let errs = input.validate(8).unwrap_err();
        for f in ["phoneNumber", "ownerJobTitle", "website"] {
            assert!(errs.has(f), "missing {}", f);
        }

        let at_limit = RegisterBusinessInput {
            phone_number: "5".repeat(64),
            owner_job_title: "t".repeat(128),
            ..valid()
        };
        assert!(at_limit.validate(8).is_ok());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::json!({
            "businessName": "Acme",
            "ownerFullName": "Ada Lovelace",
            "workEmail": "ada@acme.example",
            "password": "Passw0rd!",
            "confirmPassword": "Passw0rd!"
        });
        let input: RegisterBusinessInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.work_email, "ada@acme.example");
        assert!(input.website.is_empty());
        assert!(input.category_id.is_none());
    }
}
