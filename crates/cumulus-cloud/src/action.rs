//! Action multiplexer for cloud objects
//!
//! Maps the CLI's `create|read|update|delete` string onto the contract
//! methods, identically for every resource type.

use crate::error::{ObjectError, Result};
use crate::object::{CloudObject, ObjectSpec, Secrets};
use std::fmt;
use std::str::FromStr;

/// Lifecycle action requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Read => write!(f, "read"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for Action {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(ObjectError::OptsInvalid(format!("unknown action '{other}'"))),
        }
    }
}

/// Dispatch `action` to the matching contract method.
///
/// The spec is validated before any mutating action; `read` and `delete`
/// ignore it. `purge` only affects `delete`.
pub async fn handle_object<O: CloudObject>(
    obj: &mut O,
    spec: &O::Spec,
    action: Action,
    purge: bool,
) -> Result<Option<Secrets>> {
    match action {
        Action::Create => {
            spec.validate()?;
            tracing::info!(id = %obj.id(), "creating cloud object");
            obj.create(spec).await
        }
        Action::Read => {
            obj.read().await?;
            Ok(None)
        }
        Action::Update => {
            spec.validate()?;
            tracing::info!(id = %obj.id(), "updating cloud object");
            obj.update(spec).await
        }
        Action::Delete => {
            tracing::info!(id = %obj.id(), purge, "deleting cloud object");
            obj.delete(purge).await?;
            Ok(None)
        }
    }
}
