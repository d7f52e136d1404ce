//! Outbound verification clients.

pub mod recaptcha;

pub use recaptcha::RecaptchaVerifier;
