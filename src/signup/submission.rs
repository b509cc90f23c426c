//! Signup payload extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Field, GatewayError};
use crate::signup::validate::{is_valid_email, is_valid_name, is_valid_password, sanitize_string};

/// A validated, sanitized signup ready to be forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupSubmission {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignupSubmission {
    /// Parse a raw request body, validate each field in order (email,
    /// password, name) and return the sanitized submission.
    ///
    /// A body that is valid JSON but not an object is treated as an empty
    /// object, so it fails on the email check rather than as invalid JSON.
    pub fn from_body(body: &[u8]) -> Result<Self, GatewayError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| GatewayError::InvalidJson)?;

        let email = string_field(&value, "email")
            .filter(|s| is_valid_email(s))
            .ok_or(GatewayError::InvalidField(Field::Email))?;
        let password = string_field(&value, "password")
            .filter(|s| is_valid_password(s))
            .ok_or(GatewayError::InvalidField(Field::Password))?;
        let name = string_field(&value, "name")
            .filter(|s| is_valid_name(s))
            .ok_or(GatewayError::InvalidField(Field::Name))?;

        Ok(Self {
            email: sanitize_string(email),
            password: sanitize_string(password),
            name: sanitize_string(name),
        })
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
