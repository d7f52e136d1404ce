//! Application layer services implementing business logic.
//!
//! Services consume the domain traits and give HTTP handlers a narrow API.
//!
//! # Available Services
//!
//! - [`services::creation_service::CreationService`] - verified short URL creation
//! - [`services::lookup_service::LookupService`] - slug resolution for redirects
//! - [`services::mint_pool::MintPool`] - bounded background minting

pub mod services;
