//! S3 bucket cloud object
//!
//! Bucket create is convergent rather than guarded: the create call is skipped
//! when the bucket already exists, but the configuration pass (ACL, versioning,
//! acceleration, public-access block, default encryption) runs every time, so
//! drifted settings are pushed back to the spec.

use crate::api::{KmsApi, S3Api, codes};
use crate::kms::{Key, KeySpec};
use crate::s3::BUCKET_TOPIC;
use crate::s3::types::{
    CreateBucket, CreateBucketConfiguration, PutBucketAcl, PutBucketEncryption,
    PutBucketVersioning, PutPublicAccessBlock, PublicAccessBlockConfiguration,
    ServerSideEncryptionByDefault, ServerSideEncryptionConfigurationInput,
    ServerSideEncryptionRule, StatusConfiguration,
};
use crate::validate_name;
use async_trait::async_trait;
use cumulus_cloud::{CloudObject, Id, ObjectError, ObjectSpec, Result, Secrets};
use std::fmt;
use std::str::FromStr;

/// Canned bucket ACLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketAcl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

impl BucketAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketAcl::Private => "private",
            BucketAcl::PublicRead => "public-read",
            BucketAcl::PublicReadWrite => "public-read-write",
            BucketAcl::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl FromStr for BucketAcl {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(BucketAcl::Private),
            "public-read" => Ok(BucketAcl::PublicRead),
            "public-read-write" => Ok(BucketAcl::PublicReadWrite),
            "authenticated-read" => Ok(BucketAcl::AuthenticatedRead),
            other => Err(ObjectError::OptsInvalid(format!("unknown bucket ACL '{other}'"))),
        }
    }
}

/// Desired state for a bucket.
#[derive(Debug, Clone)]
pub struct BucketSpec {
    /// Region constraint for the bucket location; empty means the session's
    /// default region.
    pub location: String,
    pub acl: BucketAcl,
    pub object_lock: bool,
    pub versioning: bool,
    pub transfer_acceleration: bool,
    pub block_public_acls: bool,
    pub ignore_public_acls: bool,
    pub block_public_policy: bool,
    pub restrict_public_buckets: bool,
}

impl Default for BucketSpec {
    fn default() -> Self {
        Self {
            location: String::new(),
            acl: BucketAcl::Private,
            object_lock: false,
            versioning: true,
            transfer_acceleration: false,
            block_public_acls: true,
            ignore_public_acls: true,
            block_public_policy: true,
            restrict_public_buckets: true,
        }
    }
}

impl ObjectSpec for BucketSpec {
    fn validate(&self) -> Result<()> {
        if self.acl != BucketAcl::Private && self.block_public_acls {
            return Err(ObjectError::SpecInvalid(
                "public ACL conflicts with the public-access block".to_string(),
            ));
        }
        Ok(())
    }
}

/// Last-observed bucket state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStatus {
    pub name: String,
    pub encrypted: bool,
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket {} encrypted={}", self.name, self.encrypted)
    }
}

/// S3 bucket handle, owning the encryption key under the same logical name.
pub struct Bucket<C> {
    name: String,
    status: Option<BucketStatus>,
    client: C,
}

impl<C> Bucket<C>
where
    C: S3Api + KmsApi + Clone + Send + Sync,
{
    pub fn new(name: impl Into<String>, client: C) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            status: None,
            client,
        })
    }

    fn key(&self) -> Result<Key<C>> {
        Key::new(self.name.clone(), self.client.clone())
    }

    /// Push every configurable setting to its spec value.
    async fn ensure_config(&mut self, spec: &BucketSpec) -> Result<()> {
        let bucket = self.id().to_string();

        self.client
            .put_bucket_acl(PutBucketAcl {
                bucket: bucket.clone(),
                acl: spec.acl.as_str().to_string(),
            })
            .await?;
        self.client
            .put_bucket_versioning(PutBucketVersioning {
                bucket: bucket.clone(),
                versioning_configuration: StatusConfiguration::from_flag(spec.versioning),
            })
            .await?;
        self.client
            .put_bucket_accelerate_configuration(&bucket, spec.transfer_acceleration)
            .await?;
        self.client
            .put_public_access_block(PutPublicAccessBlock {
                bucket: bucket.clone(),
                public_access_block_configuration: PublicAccessBlockConfiguration {
                    block_public_acls: spec.block_public_acls,
                    ignore_public_acls: spec.ignore_public_acls,
                    block_public_policy: spec.block_public_policy,
                    restrict_public_buckets: spec.restrict_public_buckets,
                },
            })
            .await?;

        let mut key = self.key()?;
        if !key.exists().await? {
            key.create(&KeySpec::default()).await?;
        }
        self.client
            .put_bucket_encryption(PutBucketEncryption {
                bucket,
                server_side_encryption_configuration: ServerSideEncryptionConfigurationInput {
                    rules: vec![ServerSideEncryptionRule {
                        apply_server_side_encryption_by_default: ServerSideEncryptionByDefault {
                            sse_algorithm: "aws:kms".to_string(),
                            kms_master_key_id: key.id().to_string(),
                        },
                    }],
                },
            })
            .await?;

        Ok(())
    }
}

#[async_trait]
impl<C> CloudObject for Bucket<C>
where
    C: S3Api + KmsApi + Clone + Send + Sync,
{
    type Spec = BucketSpec;
    type Status = BucketStatus;

    async fn create(&mut self, spec: &BucketSpec) -> Result<Option<Secrets>> {
        if !self.exists().await? {
            let input = CreateBucket {
                bucket: self.id().to_string(),
                object_lock_enabled_for_bucket: spec.object_lock,
                create_bucket_configuration: (!spec.location.is_empty()).then(|| {
                    CreateBucketConfiguration {
                        location_constraint: spec.location.clone(),
                    }
                }),
            };
            self.client.create_bucket(input).await?;
        }

        self.ensure_config(spec).await?;
        self.read().await?;

        Ok(None)
    }

    async fn read(&mut self) -> Result<()> {
        let buckets = self.client.list_buckets().await.map_err(ObjectError::from)?;
        if !buckets.iter().any(|b| b.name == self.id().as_str()) {
            return Err(ObjectError::NotExists(format!(
                "bucket with id '{}' not found",
                self.id()
            )));
        }

        let encrypted = match self.client.get_bucket_encryption(self.id().as_str()).await {
            Ok(config) => !config.rules.is_empty(),
            Err(e) if e.is_code(codes::NO_ENCRYPTION_CONFIG) => false,
            Err(e) if e.is_code(codes::NO_SUCH_BUCKET) => {
                return Err(ObjectError::NotExists(format!(
                    "bucket with id '{}' not found",
                    self.id()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        self.status = Some(BucketStatus {
            name: self.id().to_string(),
            encrypted,
        });

        Ok(())
    }

    async fn update(&mut self, spec: &BucketSpec) -> Result<Option<Secrets>> {
        self.read().await?;
        self.ensure_config(spec).await?;
        self.read().await?;

        Ok(None)
    }

    async fn delete(&mut self, purge: bool) -> Result<()> {
        match self.client.delete_bucket(self.id().as_str()).await {
            Ok(()) => {}
            Err(e) if e.is_code(codes::NO_SUCH_BUCKET) => {}
            Err(e) => return Err(e.into()),
        }

        if purge {
            let mut key = self.key()?;
            key.delete(true).await?;
        }

        self.status = None;

        Ok(())
    }

    fn id(&self) -> Id {
        Id::derive(BUCKET_TOPIC, &self.name)
    }

    fn status(&self) -> Option<&BucketStatus> {
        self.status.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAws;

    #[test]
    fn test_bucket_id_is_deterministic() {
        let bucket = Bucket::new("orders", MockAws::new()).unwrap();
        assert_eq!(bucket.id().as_str(), "bkt-orders");
    }

    #[test]
    fn test_spec_rejects_contradictory_acl() {
        let mut spec = BucketSpec::default();
        spec.acl = BucketAcl::PublicRead;
        assert!(matches!(spec.validate(), Err(ObjectError::SpecInvalid(_))));
        spec.block_public_acls = false;
        assert!(spec.validate().is_ok());
    }

    #[tokio::test]
    async fn test_create_provisions_bucket_key_and_encryption() {
        let mock = MockAws::new();
        let mut bucket = Bucket::new("orders", mock.clone()).unwrap();

        bucket.create(&BucketSpec::default()).await.unwrap();

        assert_eq!(
            mock.mutations(),
            vec![
                "CreateBucket",
                "PutBucketAcl",
                "PutBucketVersioning",
                "PutBucketAccelerateConfiguration",
                "PutPublicAccessBlock",
                "CreateKey",
                "CreateAlias",
                "PutBucketEncryption",
            ]
        );
        assert!(bucket.status().unwrap().encrypted);
    }

    #[tokio::test]
    async fn test_create_converges_existing_bucket() {
        let mock = MockAws::new();
        let mut bucket = Bucket::new("orders", mock.clone()).unwrap();
        bucket.create(&BucketSpec::default()).await.unwrap();
        mock.clear_mutations();

        bucket.create(&BucketSpec::default()).await.unwrap();

        // no second create-bucket or create-key, but settings are re-pushed
        assert_eq!(
            mock.mutations(),
            vec![
                "PutBucketAcl",
                "PutBucketVersioning",
                "PutBucketAccelerateConfiguration",
                "PutPublicAccessBlock",
                "PutBucketEncryption",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_reports_missing_encryption() {
        let mock = MockAws::new();
        mock.seed_bucket("bkt-orders");
        let mut bucket = Bucket::new("orders", mock).unwrap();

        bucket.read().await.unwrap();

        assert!(!bucket.status().unwrap().encrypted);
    }

    #[tokio::test]
    async fn test_update_of_absent_bucket_fails() {
        let mut bucket = Bucket::new("orders", MockAws::new()).unwrap();
        let err = bucket.update(&BucketSpec::default()).await.unwrap_err();
        assert!(matches!(err, ObjectError::NotExists(_)));
    }

    #[tokio::test]
    async fn test_delete_without_purge_keeps_key() {
        let mock = MockAws::new();
        let mut bucket = Bucket::new("orders", mock.clone()).unwrap();
        bucket.create(&BucketSpec::default()).await.unwrap();

        bucket.delete(false).await.unwrap();

        assert!(!bucket.exists().await.unwrap());
        assert!(mock.has_key("alias/key-orders"));
    }

    #[tokio::test]
    async fn test_delete_with_purge_cascades_to_key() {
        let mock = MockAws::new();
        let mut bucket = Bucket::new("orders", mock.clone()).unwrap();
        bucket.create(&BucketSpec::default()).await.unwrap();

        bucket.delete(true).await.unwrap();

        assert!(!bucket.exists().await.unwrap());
        assert!(!mock.has_key("alias/key-orders"));
    }

    #[tokio::test]
    async fn test_delete_tolerates_absence() {
        let mock = MockAws::new();
        let mut bucket = Bucket::new("orders", mock.clone()).unwrap();

        bucket.delete(false).await.unwrap();

        assert!(mock.mutations().is_empty());
    }
}
