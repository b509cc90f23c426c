//! Rate limit bucket identity.
//!
//! Email and network address live in separate namespaces (`email:` / `ip:`)
//! so a caller cannot submit an email that collides with someone's address.

use std::fmt;

use serde_json::Value;

/// Who a request is counted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Email(String),
    Address(String),
}

impl Identifier {
    /// Derive the identifier from a raw body and the caller's address.
    ///
    /// The body is scanned best-effort: anything that is not a JSON object
    /// with a non-empty string `email` falls back to the address.
    pub fn from_request(body: &[u8], client_addr: Option<&str>) -> Self {
        let email = serde_json::from_slice::<Value>(body)
            .ok()
            .as_ref()
            .and_then(|value| value.get("email"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|email| !email.is_empty());

        match email {
            Some(email) => Identifier::Email(email),
            None => Identifier::Address(client_addr.unwrap_or("unknown").to_string()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Identifier::Email(_) => "email",
            Identifier::Address(_) => "ip",
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Email(email) => write!(f, "email:{email}"),
            Identifier::Address(addr) => write!(f, "ip:{addr}"),
        }
    }
}
