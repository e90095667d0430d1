//! AWS cloud objects
//!
//! Implements the cumulus [`CloudObject`](cumulus_cloud::CloudObject) contract
//! for AWS resources: RDS instances and subnet groups, KMS keys, and S3
//! buckets. Provider calls go through the typed traits in [`api`], backed by
//! the `aws` CLI wrapper in [`cli`] in production and by a recording mock in
//! tests.
//!
//! The RDS instance is the orchestrating resource: it owns a dedicated KMS
//! key, takes a pre-delete snapshot on the way out, and decides between
//! provisioning fresh and restoring from backup based on which of those two
//! artifacts it finds.

pub mod api;
pub mod cli;
pub mod kms;
pub mod rds;
pub mod s3;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use api::{ApiError, ApiResult, KmsApi, RdsApi, S3Api};
pub use cli::{AwsCli, AwsConfig};

use cumulus_cloud::{ObjectError, Result};

/// Logical resource names are bounded so every derived identifier stays within
/// provider limits.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ObjectError::OptsInvalid("given name is empty".into()));
    }
    if name.len() > 200 {
        return Err(ObjectError::OptsInvalid(
            "given name is longer than 200 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("orders").is_ok());
        assert!(validate_name(&"a".repeat(200)).is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(201)).is_err());
    }
}
