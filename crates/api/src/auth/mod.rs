//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`cookie`] -- HMAC-signed session cookie encoding and header helpers.

pub mod cookie;
pub mod password;
