//! Field syntax checks and sanitization for signup submissions.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// `local@domain.tld` shape: no whitespace, a single `@`, a dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// At least 8 characters with at least one ASCII letter and one ASCII digit.
///
/// Length is counted in UTF-16 code units, the way browsers count it, so a
/// character outside the Basic Multilingual Plane counts as two.
pub fn is_valid_password(password: &str) -> bool {
    password.encode_utf16().count() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// 2 to 50 characters after trimming; letters, whitespace, hyphens and
/// apostrophes only.
pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    let len = name.chars().count();
    (2..=50).contains(&len)
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
}

/// Strip angle brackets and surrounding whitespace.
///
/// Defense in depth only; the backend still has to escape what it stores.
pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}
