//! Input checks shared by the registries.

use agentdock_core::error::{AgentDockError, FieldError};
use std::str::FromStr;

pub(crate) const MIN_LEN: usize = 3;

/// Collects field errors while an input is checked.
#[derive(Default)]
pub(crate) struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing<T>(&mut self, field: &str) -> Option<T> {
        self.errors.push(FieldError::new(field, "is required"));
        None
    }

    /// A present string of at least [`MIN_LEN`] characters.
    pub fn required_min(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value {
            None => self.missing(field),
            Some(v) => self.min_len(field, v).then(|| v.to_string()),
        }
    }

    pub fn min_len(&mut self, field: &str, value: &str) -> bool {
        if value.chars().count() < MIN_LEN {
            self.errors.push(FieldError::new(field, format!("must be at least {MIN_LEN} characters")));
            return false;
        }
        true
    }

    /// Parse an enum value, recording `expected` as the message on failure.
    pub fn one_of<T: FromStr>(&mut self, field: &str, value: &str, expected: String) -> Option<T> {
        match value.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                self.errors.push(FieldError::new(field, format!("must be one of {expected}")));
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }

    /// The collected errors as a validation error.
    pub fn into_error(self) -> AgentDockError {
        AgentDockError::Validation(self.errors)
    }
}
