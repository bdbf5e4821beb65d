//! HTTP middleware for the Retail Back Office

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
