//! `aws` CLI wrapper
//!
//! Reaches the provider through its own CLI with JSON I/O, the same way the
//! rest of the toolchain wraps vendor tooling. Requests are serialized into
//! `--cli-input-json`; failures are parsed back into [`ApiError`] with the
//! provider's stable error code.

use crate::api::{ApiError, ApiResult, KmsApi, RdsApi, S3Api, codes};
use crate::kms::types::{CreateKey, KeyMetadata, KeyMetadataEnvelope};
use crate::rds::types::{
    CreateDbInstance, CreateDbSubnetGroup, DbInstanceInfo, DbInstanceList, DbSnapshotInfo,
    DbSnapshotList, DbSubnetGroupInfo, DbSubnetGroupList, DeleteDbInstance, ModifyDbInstance,
    ModifyDbSubnetGroup, RestoreDbInstanceFromDbSnapshot,
};
use crate::s3::types::{
    BucketInfo, BucketList, CreateBucket, GetBucketEncryptionOutput, PutBucketAcl,
    PutBucketEncryption, PutBucketVersioning, PutPublicAccessBlock,
    ServerSideEncryptionConfiguration, StatusConfiguration,
};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::process::Stdio;
use tokio::process::Command;

/// Explicit provider session configuration, passed down from the CLI flags.
#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// `aws` CLI wrapper implementing the typed API traits.
#[derive(Debug, Clone)]
pub struct AwsCli {
    config: AwsConfig,
}

impl AwsCli {
    pub fn new(config: AwsConfig) -> Self {
        Self { config }
    }

    /// Run one `aws <service> <operation>` invocation and return stdout.
    async fn run(&self, service: &str, operation: &str, input: Option<String>) -> ApiResult<String> {
        let mut cmd = Command::new("aws");
        if let Some(region) = &self.config.region {
            cmd.arg("--region").arg(region);
        }
        if let Some(profile) = &self.config.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.arg(service).arg(operation);
        if let Some(input) = &input {
            cmd.arg("--cli-input-json").arg(input);
        }
        cmd.arg("--output").arg("json");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(service, operation, "invoking aws cli");

        let output = cmd.output().await.map_err(|e| {
            ApiError::new(codes::CLI_UNAVAILABLE, format!("failed to run aws cli: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_cli_error(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Invoke an operation and parse its JSON response.
    async fn query<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        input: &impl Serialize,
    ) -> ApiResult<T> {
        let input = serialize_input(input)?;
        let out = self.run(service, operation, Some(input)).await?;
        serde_json::from_str(&out).map_err(|e| {
            ApiError::new(
                codes::INVALID_RESPONSE,
                format!("unparseable {service} {operation} response: {e}"),
            )
        })
    }

    /// Invoke an operation whose response body we discard.
    async fn execute(&self, service: &str, operation: &str, input: &impl Serialize) -> ApiResult<()> {
        let input = serialize_input(input)?;
        self.run(service, operation, Some(input)).await?;
        Ok(())
    }
}

fn serialize_input(input: &impl Serialize) -> ApiResult<String> {
    serde_json::to_string(input)
        .map_err(|e| ApiError::new(codes::INVALID_RESPONSE, format!("unserializable request: {e}")))
}

/// Parse the CLI's `An error occurred (<Code>) when calling ...: <message>`
/// diagnostic into a coded error.
fn parse_cli_error(stderr: &str) -> ApiError {
    let stderr = stderr.trim();
    if let Some(rest) = stderr.split("An error occurred (").nth(1) {
        if let Some((code, tail)) = rest.split_once(')') {
            let message = tail.split_once(": ").map(|(_, m)| m).unwrap_or(tail).trim();
            return ApiError::new(code, message);
        }
    }
    ApiError::new(codes::COMMAND_FAILED, stderr)
}

#[async_trait]
impl RdsApi for AwsCli {
    async fn create_db_instance(&self, input: CreateDbInstance) -> ApiResult<()> {
        self.execute("rds", "create-db-instance", &input).await
    }

    async fn describe_db_instances(&self, id: &str) -> ApiResult<Vec<DbInstanceInfo>> {
        let out: DbInstanceList = self
            .query("rds", "describe-db-instances", &json!({ "DBInstanceIdentifier": id }))
            .await?;
        Ok(out.db_instances)
    }

    async fn modify_db_instance(&self, input: ModifyDbInstance) -> ApiResult<()> {
        self.execute("rds", "modify-db-instance", &input).await
    }

    async fn delete_db_instance(&self, input: DeleteDbInstance) -> ApiResult<()> {
        self.execute("rds", "delete-db-instance", &input).await
    }

    async fn restore_db_instance_from_db_snapshot(
        &self,
        input: RestoreDbInstanceFromDbSnapshot,
    ) -> ApiResult<()> {
        self.execute("rds", "restore-db-instance-from-db-snapshot", &input).await
    }

    async fn describe_db_snapshots(&self, id: &str) -> ApiResult<Vec<DbSnapshotInfo>> {
        let input = json!({
            "DBSnapshotIdentifier": id,
            "IncludePublic": false,
            "IncludeShared": false,
        });
        let out: DbSnapshotList = self.query("rds", "describe-db-snapshots", &input).await?;
        Ok(out.db_snapshots)
    }

    async fn delete_db_snapshot(&self, id: &str) -> ApiResult<()> {
        self.execute("rds", "delete-db-snapshot", &json!({ "DBSnapshotIdentifier": id }))
            .await
    }

    async fn create_db_subnet_group(&self, input: CreateDbSubnetGroup) -> ApiResult<()> {
        self.execute("rds", "create-db-subnet-group", &input).await
    }

    async fn describe_db_subnet_groups(&self, name: &str) -> ApiResult<Vec<DbSubnetGroupInfo>> {
        let out: DbSubnetGroupList = self
            .query("rds", "describe-db-subnet-groups", &json!({ "DBSubnetGroupName": name }))
            .await?;
        Ok(out.db_subnet_groups)
    }

    async fn modify_db_subnet_group(&self, input: ModifyDbSubnetGroup) -> ApiResult<()> {
        self.execute("rds", "modify-db-subnet-group", &input).await
    }

    async fn delete_db_subnet_group(&self, name: &str) -> ApiResult<()> {
        self.execute("rds", "delete-db-subnet-group", &json!({ "DBSubnetGroupName": name }))
            .await
    }
}

#[async_trait]
impl KmsApi for AwsCli {
    async fn create_key(&self, input: CreateKey) -> ApiResult<KeyMetadata> {
        let out: KeyMetadataEnvelope = self.query("kms", "create-key", &input).await?;
        Ok(out.key_metadata)
    }

    async fn describe_key(&self, key_id: &str) -> ApiResult<KeyMetadata> {
        let out: KeyMetadataEnvelope = self
            .query("kms", "describe-key", &json!({ "KeyId": key_id }))
            .await?;
        Ok(out.key_metadata)
    }

    async fn create_alias(&self, alias: &str, target_key_id: &str) -> ApiResult<()> {
        let input = json!({ "AliasName": alias, "TargetKeyId": target_key_id });
        self.execute("kms", "create-alias", &input).await
    }

    async fn delete_alias(&self, alias: &str) -> ApiResult<()> {
        self.execute("kms", "delete-alias", &json!({ "AliasName": alias })).await
    }

    async fn disable_key(&self, key_id: &str) -> ApiResult<()> {
        self.execute("kms", "disable-key", &json!({ "KeyId": key_id })).await
    }

    async fn schedule_key_deletion(
        &self,
        key_id: &str,
        pending_window_days: i64,
    ) -> ApiResult<()> {
        let input = json!({ "KeyId": key_id, "PendingWindowInDays": pending_window_days });
        self.execute("kms", "schedule-key-deletion", &input).await
    }
}

#[async_trait]
impl S3Api for AwsCli {
    async fn create_bucket(&self, input: CreateBucket) -> ApiResult<()> {
        self.execute("s3api", "create-bucket", &input).await
    }

    async fn list_buckets(&self) -> ApiResult<Vec<BucketInfo>> {
        let out = self.run("s3api", "list-buckets", None).await?;
        let list: BucketList = serde_json::from_str(&out).map_err(|e| {
            ApiError::new(codes::INVALID_RESPONSE, format!("unparseable list-buckets response: {e}"))
        })?;
        Ok(list.buckets)
    }

    async fn delete_bucket(&self, bucket: &str) -> ApiResult<()> {
        self.execute("s3api", "delete-bucket", &json!({ "Bucket": bucket })).await
    }

    async fn put_bucket_acl(&self, input: PutBucketAcl) -> ApiResult<()> {
        self.execute("s3api", "put-bucket-acl", &input).await
    }

    async fn put_bucket_versioning(&self, input: PutBucketVersioning) -> ApiResult<()> {
        self.execute("s3api", "put-bucket-versioning", &input).await
    }

    async fn put_bucket_accelerate_configuration(
        &self,
        bucket: &str,
        enabled: bool,
    ) -> ApiResult<()> {
        let input = json!({
            "Bucket": bucket,
            "AccelerateConfiguration": StatusConfiguration::from_flag(enabled),
        });
        self.execute("s3api", "put-bucket-accelerate-configuration", &input).await
    }

    async fn put_public_access_block(&self, input: PutPublicAccessBlock) -> ApiResult<()> {
        self.execute("s3api", "put-public-access-block", &input).await
    }

    async fn put_bucket_encryption(&self, input: PutBucketEncryption) -> ApiResult<()> {
        self.execute("s3api", "put-bucket-encryption", &input).await
    }

    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> ApiResult<ServerSideEncryptionConfiguration> {
        let out: GetBucketEncryptionOutput = self
            .query("s3api", "get-bucket-encryption", &json!({ "Bucket": bucket }))
            .await?;
        Ok(out.server_side_encryption_configuration.unwrap_or_default())
    }
}
