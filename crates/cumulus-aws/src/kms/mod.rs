//! KMS cloud objects

pub mod key;
pub mod types;

pub use key::{Key, KeySpec, KeyStatus, KeyType, KeyUsage};

/// Topic tag composed into every key identifier.
pub const KMS_KEY_TOPIC: &str = "key";

/// Provider-enforced minimum pending window before a key is hard-deleted.
pub const KEY_DELETION_WINDOW_DAYS: i64 = 7;
