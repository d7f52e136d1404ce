//! reCAPTCHA-compatible verifier over HTTPS.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header;
use std::time::Duration;

use crate::domain::verification::{VerificationOutcome, Verifier, VerifyError};

pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Posts `secret` + `response` as a form to the siteverify endpoint and
/// reads the JSON `success` flag.
#[derive(Debug, Clone)]
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl RecaptchaVerifier {
    /// Builds a verifier whose outbound calls fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        verify_url: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build verification HTTP client")?;

        Ok(Self {
            client,
            verify_url: verify_url.into(),
            secret: secret.into(),
        })
    }
}

#[async_trait]
impl Verifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<VerificationOutcome, VerifyError> {
        let response = self
            .client
            .post(&self.verify_url)
            .header(header::ACCEPT, "application/json")
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        parse_reply(status.as_u16(), &body)
    }
}

/// Interprets a verification reply. Any non-2xx status or a body that is not
/// a JSON object with a boolean `success` is an error.
pub fn parse_reply(status: u16, body: &[u8]) -> Result<VerificationOutcome, VerifyError> {
    if !(200..300).contains(&status) {
        return Err(VerifyError::Status(status));
    }

    serde_json::from_slice::<VerificationOutcome>(body)
        .map_err(|e| VerifyError::MalformedReply(e.to_string()))
}
