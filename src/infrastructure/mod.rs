//! Infrastructure layer for external integrations.
//!
//! Implements the traits defined by the domain layer.
//!
//! # Modules
//!
//! - [`store`] - record store backends (PostgreSQL, in-memory)
//! - [`verification`] - CAPTCHA verification over HTTP

pub mod store;
pub mod verification;
