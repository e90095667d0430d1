//! S3 wire types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBucket {
    pub bucket: String,
    pub object_lock_enabled_for_bucket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_bucket_configuration: Option<CreateBucketConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBucketConfiguration {
    pub location_constraint: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketList {
    #[serde(default)]
    pub buckets: Vec<BucketInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutBucketAcl {
    pub bucket: String,
    #[serde(rename = "ACL")]
    pub acl: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutBucketVersioning {
    pub bucket: String,
    pub versioning_configuration: StatusConfiguration,
}

/// Enabled/Suspended toggle shared by versioning and transfer acceleration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusConfiguration {
    pub status: String,
}

impl StatusConfiguration {
    pub fn from_flag(enabled: bool) -> Self {
        Self {
            status: if enabled { "Enabled" } else { "Suspended" }.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutPublicAccessBlock {
    pub bucket: String,
    pub public_access_block_configuration: PublicAccessBlockConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlockConfiguration {
    pub block_public_acls: bool,
    pub ignore_public_acls: bool,
    pub block_public_policy: bool,
    pub restrict_public_buckets: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutBucketEncryption {
    pub bucket: String,
    pub server_side_encryption_configuration: ServerSideEncryptionConfigurationInput,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSideEncryptionConfigurationInput {
    pub rules: Vec<ServerSideEncryptionRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSideEncryptionRule {
    pub apply_server_side_encryption_by_default: ServerSideEncryptionByDefault,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerSideEncryptionByDefault {
    #[serde(rename = "SSEAlgorithm")]
    pub sse_algorithm: String,
    #[serde(rename = "KMSMasterKeyID")]
    pub kms_master_key_id: String,
}

/// Encryption config as returned by the get call; an empty rule list means
/// the bucket has no default encryption.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSideEncryptionConfiguration {
    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetBucketEncryptionOutput {
    #[serde(default)]
    pub server_side_encryption_configuration: Option<ServerSideEncryptionConfiguration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_configuration_flag() {
        assert_eq!(StatusConfiguration::from_flag(true).status, "Enabled");
        assert_eq!(StatusConfiguration::from_flag(false).status, "Suspended");
    }

    #[test]
    fn test_encryption_input_wire_names() {
        let input = PutBucketEncryption {
            bucket: "bkt-orders".into(),
            server_side_encryption_configuration: ServerSideEncryptionConfigurationInput {
                rules: vec![ServerSideEncryptionRule {
                    apply_server_side_encryption_by_default: ServerSideEncryptionByDefault {
                        sse_algorithm: "aws:kms".into(),
                        kms_master_key_id: "alias/key-orders".into(),
                    },
                }],
            },
        };
        let value = serde_json::to_value(&input).unwrap();
        let rule = &value["ServerSideEncryptionConfiguration"]["Rules"][0];
        assert_eq!(rule["ApplyServerSideEncryptionByDefault"]["SSEAlgorithm"], "aws:kms");
        assert_eq!(
            rule["ApplyServerSideEncryptionByDefault"]["KMSMasterKeyID"],
            "alias/key-orders"
        );
    }
}
