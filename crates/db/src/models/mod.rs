//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity matching the table row, plus a
//! create DTO where the insert input differs from a core type.

pub mod link;
pub mod session;
pub mod user;
