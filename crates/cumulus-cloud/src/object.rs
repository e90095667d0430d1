//! Cloud object trait definition
//!
//! A cloud object is a handle to one provider-side resource. The handle owns a
//! logical `name` and recomputes every provider-facing identifier from it, so
//! two handles built with the same name always address the same resource. No
//! identifier is ever persisted locally.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A deterministic provider-facing identifier.
///
/// Always derived as `<topic>-<name>` from a fixed topic tag and the resource's
/// logical name. This derivation is a contract: existence-based idempotence
/// depends on identical `(topic, name)` pairs resolving to identical ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id(String);

impl Id {
    /// Derive the identifier for `name` under `topic`.
    pub fn derive(topic: &str, name: &str) -> Self {
        Id(format!("{topic}-{name}"))
    }

    /// Wrap an already-composed identifier (e.g. an alias path).
    pub fn raw(id: impl Into<String>) -> Self {
        Id(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generated credential artifacts returned from create/update.
///
/// Currently a declared return channel only; resources return `None` until
/// master-credential generation lands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets(BTreeMap<String, String>);

impl Secrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Desired-state descriptor supplied by the caller.
pub trait ObjectSpec: Send + Sync {
    /// Check the spec's internal invariants before it is acted on.
    fn validate(&self) -> Result<()>;
}

/// Uniform lifecycle contract for provider resources.
///
/// Each resource type binds its own spec and status types, so handing the
/// wrong spec variant to a resource is a compile error rather than a runtime
/// `SpecInvalid`.
#[async_trait]
pub trait CloudObject: Send {
    /// Desired-state type for this resource.
    type Spec: ObjectSpec;
    /// Last-observed live state, refreshed by `read`.
    type Status: fmt::Debug + Send + Sync;

    /// Bring the resource into existence. Idempotent: an already-existing
    /// resource is a no-op success.
    async fn create(&mut self, spec: &Self::Spec) -> Result<Option<Secrets>>;

    /// Refresh `status` from live provider state. Absence is signaled with
    /// [`crate::ObjectError::NotExists`].
    async fn read(&mut self) -> Result<()>;

    /// Mutate the resource toward `spec`, based on freshly read state.
    async fn update(&mut self, spec: &Self::Spec) -> Result<Option<Secrets>>;

    /// Remove the provider-side resource. `purge` skips recovery artifacts and
    /// cascades to dependent objects; the in-memory handle stays valid.
    async fn delete(&mut self, purge: bool) -> Result<()>;

    /// The deterministic provider-facing identifier for this handle.
    fn id(&self) -> Id;

    /// Last-observed state, populated by a successful `read`.
    fn status(&self) -> Option<&Self::Status>;

    /// Existence derived from `read`: only `NotExists` maps to `false`, every
    /// other failure propagates.
    async fn exists(&mut self) -> Result<bool> {
        match self.read().await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_exists() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
