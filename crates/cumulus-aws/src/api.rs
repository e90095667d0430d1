//! Typed AWS API boundary
//!
//! The provider is a black-box RPC surface; these traits are the slice of it
//! the resources drive. Production backs them with the `aws` CLI wrapper
//! ([`crate::cli::AwsCli`]); tests back them with a recording mock. Error
//! codes are load-bearing: resources branch on them, not on message text.

use crate::kms::types::{CreateKey, KeyMetadata};
use crate::rds::types::{
    CreateDbInstance, CreateDbSubnetGroup, DbInstanceInfo, DbSnapshotInfo, DbSubnetGroupInfo,
    DeleteDbInstance, ModifyDbInstance, ModifyDbSubnetGroup, RestoreDbInstanceFromDbSnapshot,
};
use crate::s3::types::{
    BucketInfo, CreateBucket, PutBucketAcl, PutBucketEncryption, PutBucketVersioning,
    PutPublicAccessBlock, ServerSideEncryptionConfiguration,
};
use async_trait::async_trait;
use cumulus_cloud::ObjectError;
use thiserror::Error;

/// Stable provider error codes the resources branch on.
pub mod codes {
    pub const DB_INSTANCE_NOT_FOUND: &str = "DBInstanceNotFound";
    pub const DB_SNAPSHOT_NOT_FOUND: &str = "DBSnapshotNotFound";
    pub const DB_SUBNET_GROUP_NOT_FOUND: &str = "DBSubnetGroupNotFoundFault";
    pub const KMS_NOT_FOUND: &str = "NotFoundException";
    pub const NO_SUCH_BUCKET: &str = "NoSuchBucket";
    pub const NO_ENCRYPTION_CONFIG: &str = "ServerSideEncryptionConfigurationNotFoundError";

    /// Synthetic codes for failures local to the wrapper itself.
    pub const CLI_UNAVAILABLE: &str = "CliUnavailable";
    pub const COMMAND_FAILED: &str = "CommandFailed";
    pub const INVALID_RESPONSE: &str = "InvalidResponse";
}

/// A provider call failure, carrying the provider's machine-readable code.
#[derive(Error, Debug, Clone)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code == code
    }
}

/// Opaque passthrough into the object error taxonomy, keeping the code.
impl From<ApiError> for ObjectError {
    fn from(err: ApiError) -> Self {
        ObjectError::Provider {
            code: err.code,
            message: err.message,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// RDS operations used by the instance and subnet-group objects.
#[async_trait]
pub trait RdsApi: Send + Sync {
    async fn create_db_instance(&self, input: CreateDbInstance) -> ApiResult<()>;
    async fn describe_db_instances(&self, id: &str) -> ApiResult<Vec<DbInstanceInfo>>;
    async fn modify_db_instance(&self, input: ModifyDbInstance) -> ApiResult<()>;
    async fn delete_db_instance(&self, input: DeleteDbInstance) -> ApiResult<()>;
    async fn restore_db_instance_from_db_snapshot(
        &self,
        input: RestoreDbInstanceFromDbSnapshot,
    ) -> ApiResult<()>;
    async fn describe_db_snapshots(&self, id: &str) -> ApiResult<Vec<DbSnapshotInfo>>;
    async fn delete_db_snapshot(&self, id: &str) -> ApiResult<()>;

    async fn create_db_subnet_group(&self, input: CreateDbSubnetGroup) -> ApiResult<()>;
    async fn describe_db_subnet_groups(&self, name: &str) -> ApiResult<Vec<DbSubnetGroupInfo>>;
    async fn modify_db_subnet_group(&self, input: ModifyDbSubnetGroup) -> ApiResult<()>;
    async fn delete_db_subnet_group(&self, name: &str) -> ApiResult<()>;
}

/// KMS operations used by the key object.
///
/// Identity goes through the alias, never raw key ids: aliases are the only
/// names we can recompute from a logical name.
#[async_trait]
pub trait KmsApi: Send + Sync {
    async fn create_key(&self, input: CreateKey) -> ApiResult<KeyMetadata>;
    async fn describe_key(&self, key_id: &str) -> ApiResult<KeyMetadata>;
    async fn create_alias(&self, alias: &str, target_key_id: &str) -> ApiResult<()>;
    async fn delete_alias(&self, alias: &str) -> ApiResult<()>;
    async fn disable_key(&self, key_id: &str) -> ApiResult<()>;
    async fn schedule_key_deletion(&self, key_id: &str, pending_window_days: i64)
    -> ApiResult<()>;
}

/// S3 operations used by the bucket object.
#[async_trait]
pub trait S3Api: Send + Sync {
    async fn create_bucket(&self, input: CreateBucket) -> ApiResult<()>;
    async fn list_buckets(&self) -> ApiResult<Vec<BucketInfo>>;
    async fn delete_bucket(&self, bucket: &str) -> ApiResult<()>;
    async fn put_bucket_acl(&self, input: PutBucketAcl) -> ApiResult<()>;
    async fn put_bucket_versioning(&self, input: PutBucketVersioning) -> ApiResult<()>;
    async fn put_bucket_accelerate_configuration(
        &self,
        bucket: &str,
        enabled: bool,
    ) -> ApiResult<()>;
    async fn put_public_access_block(&self, input: PutPublicAccessBlock) -> ApiResult<()>;
    async fn put_bucket_encryption(&self, input: PutBucketEncryption) -> ApiResult<()>;
    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> ApiResult<ServerSideEncryptionConfiguration>;
}
