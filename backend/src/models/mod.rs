//! Database models for the Retail Back Office
//!
//! Re-exports models from the shared crate; row-mapping structs live next to
//! the services that query them.

pub use shared::models::*;
