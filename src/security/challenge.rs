//! Human-presence challenge verification.
//!
//! The caller submits a token under one of several field names; the token is
//! checked with a single form-encoded POST to the verification service. Any
//! failure along the way (no token, transport error, non-2xx status, body
//! without `success: true`) counts as a failed challenge. There is no retry.

use serde::Deserialize;
use serde_json::Value;

use crate::config::ChallengeConfig;
use crate::observability::metrics;

/// Body fields that may carry the challenge token, in lookup order.
pub const TOKEN_FIELDS: [&str; 3] = ["captcha", "captcha_token", "g-recaptcha-response"];

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
}

/// Pull the challenge token out of a raw body.
///
/// Parse failures are treated as "no token" and left for verification to
/// reject. Empty strings are skipped in favour of the next alias.
pub fn extract_token(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    TOKEN_FIELDS
        .iter()
        .filter_map(|field| value.get(*field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Client for the verification endpoint.
pub struct ChallengeVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl ChallengeVerifier {
    pub fn new(client: reqwest::Client, config: &ChallengeConfig) -> Self {
        if config.secret.is_empty() {
            tracing::warn!("Challenge secret is empty; every verification will fail");
        }
        Self {
            client,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
        }
    }

    /// Verify `token` for the caller at `remote_ip`. Returns `true` only when
    /// the service confirms the token.
    pub async fn verify(&self, token: Option<&str>, remote_ip: Option<&str>) -> bool {
        let passed = self.call(token, remote_ip).await;
        metrics::record_challenge(passed);
        passed
    }

    async fn call(&self, token: Option<&str>, remote_ip: Option<&str>) -> bool {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::debug!("No challenge token submitted");
            return false;
        };
        if self.secret.is_empty() {
            return false;
        }

        let mut form = vec![("response", token), ("secret", self.secret.as_str())];
        if let Some(ip) = remote_ip.filter(|ip| !ip.is_empty()) {
            form.push(("remoteip", ip));
        }

        let response = match self.client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Challenge verification request failed");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Challenge verification service returned an error");
            return false;
        }

        match response.json::<VerifyResponse>().await {
            Ok(body) => body.success,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable challenge verification response");
                false
            }
        }
    }
}
