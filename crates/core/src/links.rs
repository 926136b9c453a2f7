//! Link creation and shortcode resolution.

use async_trait::async_trait;
use validator::ValidateUrl;

use crate::error::CoreError;
use crate::idgen::{generate_unique, IdLookup, IdSpace, DEFAULT_MAX_ATTEMPTS};
use crate::types::DbId;

/// Number of times [`create_link`] retries after losing an insert race.
pub const MAX_INSERT_ATTEMPTS: u32 = 3;

/// Longest destination URL accepted.
pub const MAX_URL_LENGTH: usize = 2048;

/// A link about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub id: DbId,
    pub shortcode: String,
    pub url: String,
    pub owner_user_id: DbId,
}

/// Write side of the links table used by [`create_link`].
#[async_trait]
pub trait LinkStore: IdLookup {
    /// Insert a link. A duplicate id or shortcode must yield
    /// [`CoreError::Conflict`].
    async fn insert_link(&self, link: &NewLink) -> Result<(), CoreError>;
}

/// Check that `url` is a non-empty absolute URL of acceptable length with
/// no control characters.
pub fn validate_url(url: &str) -> Result<(), CoreError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CoreError::Validation("URL must not be empty".into()));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(CoreError::Validation(format!(
            "URL must be at most {MAX_URL_LENGTH} characters"
        )));
    }
    // The URL parser drops embedded tabs and line breaks, but the stored
    // string must remain a valid `Location` header.
    if url.chars().any(char::is_control) {
        return Err(CoreError::Validation(
            "URL must not contain control characters".into(),
        ));
    }
    if !url.validate_url() {
        return Err(CoreError::Validation(format!("{url:?} is not a valid URL")));
    }
    Ok(())
}

/// Allocate an id, derive its shortcode and insert the link.
///
/// The id check and the insert are separate statements, so a concurrent
/// writer can take the same id first. The store's uniqueness constraint
/// reports that as [`CoreError::Conflict`] and the whole sequence is retried
/// up to [`MAX_INSERT_ATTEMPTS`] times.
pub async fn create_link<S>(
    store: &S,
    space: &IdSpace,
    url: &str,
    owner_user_id: DbId,
) -> Result<NewLink, CoreError>
where
    S: LinkStore + ?Sized,
{
    validate_url(url)?;
    let url = url.trim();

    let mut last_conflict = None;
    for attempt in 1..=MAX_INSERT_ATTEMPTS {
        let id = generate_unique(store, space, DEFAULT_MAX_ATTEMPTS).await?;
        let link = NewLink {
            id,
            shortcode: space.encode(id)?,
            url: url.to_string(),
            owner_user_id,
        };

        match store.insert_link(&link).await {
            Ok(()) => {
                tracing::info!(id, shortcode = %link.shortcode, owner_user_id, "Created link");
                return Ok(link);
            }
            Err(CoreError::Conflict(msg)) => {
                tracing::warn!(attempt, id, "Link id taken by a concurrent insert, retrying");
                last_conflict = Some(msg);
            }
            Err(e) => return Err(e),
        }
    }

    Err(CoreError::Conflict(last_conflict.unwrap_or_else(|| {
        "could not insert link after retries".to_string()
    })))
}

/// Map a shortcode from a request path to the link id it encodes.
///
/// Any code that cannot name a link in this space is reported as not found.
pub fn resolve_shortcode(code: &str, space: &IdSpace) -> Result<DbId, CoreError> {
    space.decode(code).map_err(|e| {
        tracing::debug!(code, error = %e, "Rejected shortcode");
        CoreError::NotFound {
            entity: "Link",
            key: code.to_string(),
        }
    })
}
