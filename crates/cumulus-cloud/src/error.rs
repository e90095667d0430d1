//! Cloud object error types
//!
//! These kinds are semantic, not diagnostic: callers branch on them. The only
//! locally recovered kind is `NotExists` (see [`crate::object::CloudObject::exists`]);
//! everything else surfaces to the caller unmodified.

use thiserror::Error;

/// Cloud object errors
#[derive(Error, Debug)]
pub enum ObjectError {
    /// The object does not exist on the provider side.
    #[error("object not found: {0}")]
    NotExists(String),

    /// The object exists but is not in a state that permits the operation.
    #[error("object not ready: {0}")]
    NotReady(String),

    /// The object already exists on the provider side.
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    /// A derived identifier clashes with a pre-existing provider resource.
    /// Deliberately fatal: auto-repair of ambiguous partial state risks data loss.
    #[error("identifier collision: {0}")]
    IdCollision(String),

    /// The desired-state spec is invalid for the current action.
    #[error("invalid spec: {0}")]
    SpecInvalid(String),

    /// An options value (name, purge flag, ...) is invalid for the current action.
    #[error("invalid options: {0}")]
    OptsInvalid(String),

    /// The provider returned more than one match for a uniquely-named resource.
    /// A modeling assumption is violated; never retried.
    #[error("ambiguous identifier: {0}")]
    AmbiguousIdentifier(String),

    /// Create would restore from a backup, but the spec does not opt in.
    #[error("restoration disabled: {0}")]
    RestorationDisabled(String),

    /// Opaque passthrough of a provider-level error, keeping its stable code.
    #[error("provider error [{code}]: {message}")]
    Provider { code: String, message: String },
}

impl ObjectError {
    pub fn is_not_exists(&self) -> bool {
        matches!(self, ObjectError::NotExists(_))
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, ObjectError::NotReady(_))
    }

    pub fn is_id_collision(&self) -> bool {
        matches!(self, ObjectError::IdCollision(_))
    }

    pub fn is_spec_invalid(&self) -> bool {
        matches!(self, ObjectError::SpecInvalid(_))
    }

    pub fn is_restoration_disabled(&self) -> bool {
        matches!(self, ObjectError::RestorationDisabled(_))
    }
}

/// Swallow `NotExists`, keep everything else.
///
/// Used where already-gone is an acceptable terminal state, e.g. deleting an
/// alias that a previous run removed.
pub fn ignore_not_exists(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_exists() => Ok(()),
        other => other,
    }
}

pub type Result<T> = std::result::Result<T, ObjectError>;
