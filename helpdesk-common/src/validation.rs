use std::collections::BTreeMap;
use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::HelpdeskError;

#[allow(clippy::unwrap_used)]
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Per-field validation messages, keyed by the request field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Collects field errors for one request body and turns them into a single
/// [HelpdeskError::Validation].
#[derive(Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if value.trim().chars().count() < min {
            if min <= 1 {
                self.errors.add(field, "must not be empty");
            } else {
                self.errors
                    .add(field, format!("must be at least {min} characters"));
            }
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !EMAIL_RE.is_match(value.trim()) {
            self.errors.add(field, "must be a valid email address");
        }
        self
    }

    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        match url::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => (),
            _ => self.errors.add(field, "must be a valid http(s) URL"),
        }
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.add(field, message);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), HelpdeskError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(HelpdeskError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
