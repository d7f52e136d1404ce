//! Domain layer: storage and verification contracts.
//!
//! Traits defined here are implemented by the infrastructure layer and
//! consumed by [`crate::application::services`].
//!
//! - [`store`] - slug → long URL record store and its error taxonomy
//! - [`verification`] - external CAPTCHA verification

pub mod store;
pub mod verification;

pub use store::{RecordStore, StoreError};
pub use verification::{VerificationOutcome, Verifier, VerifyError};

#[cfg(test)]
pub use store::MockRecordStore;
#[cfg(test)]
pub use verification::MockVerifier;
