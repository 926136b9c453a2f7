//! Request handlers.
//!
//! Handlers delegate to `shortlink_core` for domain rules and to the
//! repositories in `shortlink_db` for storage, mapping errors via
//! [`AppError`](crate::error::AppError).

pub mod auth;
pub mod links;
pub mod redirect;
