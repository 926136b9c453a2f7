//! Random link id generation with a bounded uniqueness check.
//!
//! Ids are drawn uniformly from the [`IdSpace`]: every integer whose shortcode
//! fits in `max_digits` characters of the universe. [`generate_unique`] keeps
//! drawing until the store reports a free id or the attempt budget runs out.
//!
//! The existence check and the caller's insert are not atomic. The primary
//! key on `links.id` is the authoritative guard; see
//! [`crate::links::create_link`] for the conflict retry.

use async_trait::async_trait;
use rand::Rng;

use crate::codec::{decode, Universe};
use crate::error::CoreError;
use crate::types::DbId;

/// Default number of draws before [`generate_unique`] gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Point lookup used by [`generate_unique`] to test a candidate.
#[async_trait]
pub trait IdLookup: Send + Sync {
    /// Whether a link with this id already exists.
    async fn id_exists(&self, id: DbId) -> Result<bool, CoreError>;
}

/// A universe together with the maximum shortcode length.
#[derive(Debug, Clone)]
pub struct IdSpace {
    universe: Universe,
    max_digits: u32,
    max_value: DbId,
}

impl IdSpace {
    /// Build an id space, precomputing the largest representable id.
    ///
    /// The largest id is the decoded value of `max_digits` copies of the
    /// highest digit, i.e. `base^max_digits - 1`. It must fit in a [`DbId`].
    pub fn new(universe: Universe, max_digits: u32) -> Result<Self, CoreError> {
        if max_digits == 0 {
            return Err(CoreError::Validation(
                "shortcode length must be at least 1".into(),
            ));
        }

        // No base >= 2 fits more than this many digits in a positive i64.
        let digit_limit = (DbId::MAX as u64).ilog(universe.base()) + 1;
        if max_digits > digit_limit {
            return Err(CoreError::Validation(format!(
                "{max_digits} digits of base {} do not fit in a 64-bit id",
                universe.base()
            )));
        }

        let all_high: String = std::iter::repeat(universe.last())
            .take(max_digits as usize)
            .collect();
        let max_value = decode(&all_high, &universe)
            .ok()
            .and_then(|v| DbId::try_from(v).ok())
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "{max_digits} digits of base {} do not fit in a 64-bit id",
                    universe.base()
                ))
            })?;

        Ok(Self {
            universe,
            max_digits,
            max_value,
        })
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn max_digits(&self) -> u32 {
        self.max_digits
    }

    /// Largest id in the space (inclusive).
    pub fn max_value(&self) -> DbId {
        self.max_value
    }

    /// Whether `id` falls inside the space.
    pub fn contains(&self, id: DbId) -> bool {
        (0..=self.max_value).contains(&id)
    }

    /// Shortcode for an id in this space.
    pub fn encode(&self, id: DbId) -> Result<String, CoreError> {
        if !self.contains(id) {
            return Err(CoreError::Validation(format!(
                "id {id} is outside the shortcode space"
            )));
        }
        Ok(crate::codec::encode(id as u64, &self.universe))
    }

    /// Id for a shortcode, rejecting codes longer than the space allows.
    pub fn decode(&self, code: &str) -> Result<DbId, CoreError> {
        if code.chars().count() > self.max_digits as usize {
            return Err(CoreError::Malformed(format!(
                "code is longer than {} characters",
                self.max_digits
            )));
        }
        let value = decode(code, &self.universe)?;
        DbId::try_from(value)
            .ok()
            .filter(|id| self.contains(*id))
            .ok_or_else(|| CoreError::Malformed(format!("code {code:?} is outside the id space")))
    }
}

/// Draw a uniformly random id in `[0, max_value]`.
pub fn random_candidate(space: &IdSpace) -> DbId {
    rand::rng().random_range(0..=space.max_value)
}

/// Draw candidates until one is free in `lookup`.
///
/// Fails with [`CoreError::Exhausted`] after `max_attempts` occupied draws.
/// Lookup errors are returned immediately.
pub async fn generate_unique<L>(
    lookup: &L,
    space: &IdSpace,
    max_attempts: u32,
) -> Result<DbId, CoreError>
where
    L: IdLookup + ?Sized,
{
    for attempt in 1..=max_attempts {
        let candidate = random_candidate(space);
        if !lookup.id_exists(candidate).await? {
            if attempt > 1 {
                tracing::debug!(attempt, candidate, "Found free link id after collisions");
            }
            return Ok(candidate);
        }
    }

    tracing::warn!(
        max_attempts,
        max_value = space.max_value,
        "Link id space exhausted"
    );
    Err(CoreError::Exhausted {
        attempts: max_attempts,
    })
}
