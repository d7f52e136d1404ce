//! Contract for the external bot-mitigation (CAPTCHA) check.

use async_trait::async_trait;
use serde::Deserialize;

/// Parsed reply of the verification service.
///
/// `success` is mandatory; a reply without it does not deserialize and is
/// treated as a failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerificationOutcome {
    pub success: bool,

    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,

    #[serde(default)]
    pub hostname: Option<String>,
}

impl VerificationOutcome {
    pub fn passed() -> Self {
        Self {
            success: true,
            error_codes: Vec::new(),
            hostname: None,
        }
    }

    pub fn refused(error_codes: Vec<String>) -> Self {
        Self {
            success: false,
            error_codes,
            hostname: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Connection failure or timeout: the service could not be asked.
    #[error("verification service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("verification service answered with status {0}")]
    Status(u16),

    /// The service answered 2xx with a body that is not a verification reply.
    #[error("verification reply could not be parsed: {0}")]
    MalformedReply(String),
}

/// One outbound verification call per creation request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerificationOutcome, VerifyError>;
}
