//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid session cookie.
//! - [`auth::CurrentSession`] -- Classifies the session without rejecting.

pub mod auth;
