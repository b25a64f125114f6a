use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collects field-level failures for a request body.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field,
                message: message.to_string(),
            });
        }
        self
    }

    pub fn required(&mut self, field: &'static str, value: &str, message: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, message)
    }

    pub fn max_chars(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        max: usize,
        message: &str,
    ) -> &mut Self {
        let ok = value.map_or(true, |v| v.chars().count() <= max);
        self.check(ok, field, message)
    }

    pub fn chars_between(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        max: usize,
        message: &str,
    ) -> &mut Self {
        let len = value.chars().count();
        self.check(len >= min && len <= max, field, message)
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "Enter a valid email")
    }

    pub fn optional_url(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        let ok = match value.map(str::trim) {
            None | Some("") => true,
            Some(url) => is_valid_url(url),
        };
        self.check(ok, field, "Must be a valid http(s) URL")
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
    }
    URL_RE.is_match(url)
}

/// Trims an optional string, mapping blank input to `None`.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failure() {
        let mut v = Validator::new();
        v.required("title", "   ", "Recipe title is required")
            .max_chars("unit", Some("a very long unit name"), 5, "Unit too long")
            .email("email", "not-an-email");
        match v.finish() {
            Err(AppError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["title", "unit", "email"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn passes_clean_input() {
        let mut v = Validator::new();
        v.required("name", "Milk", "Item name is required")
            .chars_between("content", "Lovely", 2, 1000, "bad length")
            .optional_url("image_url", Some("https://img.example.com/a.png"))
            .optional_url("profile_picture", None);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn url_and_email_rules() {
        assert!(is_valid_email("alice@x.com"));
        assert!(!is_valid_email("alice@x"));
        assert!(is_valid_url("http://example.com/pic.jpg"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn trimmed_drops_blank() {
        assert_eq!(trimmed(Some("  cup ".into())), Some("cup".into()));
        assert_eq!(trimmed(Some("   ".into())), None);
        assert_eq!(trimmed(None), None);
    }
}
