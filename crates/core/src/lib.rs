//! Domain logic for the link shortener.
//!
//! Everything in this crate is storage-agnostic: persistence is reached only
//! through the traits in [`idgen`], [`links`] and [`session`], which the `db`
//! crate implements on top of sqlx.

pub mod accounts;
pub mod codec;
pub mod error;
pub mod idgen;
pub mod links;
pub mod session;
pub mod types;
