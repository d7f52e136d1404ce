//! Record store backends.
//!
//! - [`PgRecordStore`] - PostgreSQL via SQLx, the production backend
//! - [`MemoryRecordStore`] - `DashMap`-backed, for tests and local runs

pub mod memory;
pub mod pg;

pub use memory::MemoryRecordStore;
pub use pg::PgRecordStore;
