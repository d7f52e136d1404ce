//! Business logic services for the application layer.

pub mod creation_service;
pub mod lookup_service;
pub mod mint_pool;

pub use creation_service::{CreatedLink, CreationService};
pub use lookup_service::LookupService;
pub use mint_pool::MintPool;
