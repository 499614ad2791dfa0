//! Field-level request validation.
//!
//! Every violated rule is collected so that callers see all problems at once
//! rather than fixing one field per round trip.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError { field, message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Required, with a character-count range.
    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len == 0 {
            self.add(field, "cannot be blank");
        } else if len < min || len > max {
            self.add(field, format!("the length must be between {} and {}", min, max));
        }
    }

    /// Like [`length`](Self::length) but counts every character as sent;
    /// leading and trailing whitespace in a secret is significant.
    pub fn secret_length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len == 0 {
            self.add(field, "cannot be blank");
        } else if len < min || len > max {
            self.add(field, format!("the length must be between {} and {}", min, max));
        }
    }

    /// Optional; only bounded above.
    pub fn max_length(&mut self, field: &'static str, value: &str, max: usize) {
        if value.trim().chars().count() > max {
            self.add(field, format!("the length must be no more than {}", max));
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        if !value.trim().is_empty() && !is_email(value.trim()) {
            self.add(field, "must be a valid email address");
        }
    }

    /// Optional absolute http(s) URL.
    pub fn optional_url(&mut self, field: &'static str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match url::Url::parse(value) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => {}
            _ => self.add(field, "must be a valid URL"),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Syntactic check only: `local@domain.tld`, no whitespace, one `@`.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else { return false };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty() && !l.starts_with('-') && !l.ends_with('-'))
        && labels.last().is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(is_email("owner@acme.com"));
        assert!(is_email("first.last+tag@mail.acme.co"));
        assert!(!is_email("owner@acme"));
        assert!(!is_email("owner acme@acme.com"));
        assert!(!is_email("@acme.com"));
        assert!(!is_email("a@b@acme.com"));
        assert!(!is_email("owner@.com"));
        assert!(!is_email("owner@acme.c0m"));
    }

    #[test]
    fn collects_every_violation() {
        let mut errs = ValidationErrors::new();
        errs.length("businessName", "", 2, 128);
        errs.length("ownerFullName", "Al", 5, 128);
        errs.email("workEmail", "nope");
        errs.optional_url("website", "ftp://files.acme.com");
        assert_eq!(
            errs.fields().collect::<Vec<_>>(),
            vec!["businessName", "ownerFullName", "workEmail", "website"]
        );
        assert!(errs.to_string().contains("businessName: cannot be blank"));
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let mut errs = ValidationErrors::new();
        errs.length("name", "Zoë", 3, 3);
        assert!(errs.is_empty());
    }

    #[test]
    fn secret_length_keeps_surrounding_whitespace() {
        let mut errs = ValidationErrors::new();
        errs.secret_length("password", "abcdefg ", 8, 128);
        errs.secret_length("password", " abcdefg", 8, 128);
        assert!(errs.is_empty());
        errs.secret_length("password", "", 8, 128);
        assert!(errs.to_string().contains("password: cannot be blank"));
    }

    #[test]
    fn max_length_allows_empty_and_rejects_overlong() {
        let mut errs = ValidationErrors::new();
        errs.max_length("phoneNumber", "", 64);
        errs.max_length("phoneNumber", &"9".repeat(64), 64);
        assert!(errs.is_empty());
        errs.max_length("phoneNumber", &"9".repeat(65), 64);
        assert!(errs.has("phoneNumber"));
    }

    #[test]
    fn empty_website_is_allowed() {
        let mut errs = ValidationErrors::new();
        errs.optional_url("website", "  ");
        errs.optional_url("website", "https://acme.example/about");
        assert!(errs.into_result().is_ok());
    }
}
