//! Cumulus cloud object contract
//!
//! This crate defines the uniform lifecycle contract every cumulus resource
//! implements, the semantic error taxonomy used for control flow, and the
//! generic action multiplexer the CLI drives resources through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  cumulus CLI                     │
//! │         (cumulus instance create orders)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               cumulus-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        Object contract                    │   │
//! │  │  trait CloudObject { create/read/.. }     │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Error kinds  │  │ Action mux   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │  cumulus-aws  │
//! │   resources   │
//! └───────────────┘
//! ```

pub mod action;
pub mod error;
pub mod object;

// Re-exports
pub use action::{Action, handle_object};
pub use error::{ObjectError, Result, ignore_not_exists};
pub use object::{CloudObject, Id, ObjectSpec, Secrets};
