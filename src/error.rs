//! Error types for stat access and effect processing.
//!
//! None of these abort the simulation. The infallible entry points log
//! them through `tracing` and recover locally; the `try_*` entry points
//! hand them back to the caller.

use crate::effect::EffectId;
use crate::stat_tag::{EffectType, StatTag};
use thiserror::Error;

/// Errors raised by the stat store and its configuration.
///
/// # Examples
///
/// ```rust
/// use zzeffect::{StatError, StatTag};
///
/// let err = StatError::UnknownStat(StatTag::Health);
/// assert_eq!(err.to_string(), "Stat not configured: health");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatError {
    /// A read or write targeted a tag the entity was not configured with.
    #[error("Stat not configured: {0}")]
    UnknownStat(StatTag),

    /// The same tag appeared more than once in a configuration.
    ///
    /// The first entry wins; later ones are skipped.
    #[error("Duplicate stat in configuration: {0}")]
    DuplicateStat(StatTag),

    /// A configuration document could not be parsed.
    #[error("Invalid stat configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while adding, removing or running effects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EffectError {
    /// A unique effect of this type is already active.
    #[error("Unique effect already active: {0}")]
    DuplicateUniqueEffect(EffectType),

    /// The id no longer resolves, or resolves to a different effect type.
    #[error("Effect {id} does not resolve to an active {expected} effect")]
    StaleHandle { id: EffectId, expected: EffectType },

    /// A handler was constructed with parameters it cannot run with.
    #[error("Invalid handler {handler}: {reason}")]
    InvalidHandler { handler: String, reason: String },

    /// A handler failed while running. The rest of the tick continues.
    #[error("Handler {handler} failed: {reason}")]
    HandlerFault { handler: String, reason: String },

    #[error(transparent)]
    Stat(#[from] StatError),
}

impl EffectError {
    /// Create a `HandlerFault` with a handler description and a reason.
    pub fn fault(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HandlerFault {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}
