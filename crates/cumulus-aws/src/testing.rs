//! In-memory provider double for resource tests.
//!
//! Behaves like the real API at the level the resources care about: describe
//! calls on absent resources fail with the provider's not-found codes, create
//! calls collide on duplicate identifiers, and a non-skipping instance delete
//! leaves a final snapshot behind. Successful mutations are recorded by their
//! provider operation name so tests can assert exact call sequences.

use crate::api::{ApiError, ApiResult, KmsApi, RdsApi, S3Api, codes};
use crate::kms::types::{CreateKey, KeyMetadata};
use crate::rds::types::{
    CreateDbInstance, CreateDbSubnetGroup, DbInstanceInfo, DbSnapshotInfo, DbSubnetGroupInfo,
    DbSubnetGroupRef, DeleteDbInstance, Endpoint, ModifyDbInstance, ModifyDbSubnetGroup,
    RestoreDbInstanceFromDbSnapshot, SubnetRef,
};
use crate::s3::types::{
    BucketInfo, CreateBucket, PutBucketAcl, PutBucketEncryption, PutBucketVersioning,
    PutPublicAccessBlock, ServerSideEncryptionConfiguration,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    instances: BTreeMap<String, DbInstanceInfo>,
    snapshots: BTreeSet<String>,
    subnet_groups: BTreeMap<String, DbSubnetGroupInfo>,
    keys: BTreeMap<String, KeyMetadata>,
    aliases: BTreeMap<String, String>,
    buckets: BTreeSet<String>,
    encrypted_buckets: BTreeSet<String>,
    mutations: Vec<String>,
    create_instance_inputs: Vec<CreateDbInstance>,
    modify_inputs: Vec<ModifyDbInstance>,
    delete_inputs: Vec<DeleteDbInstance>,
    fail_create_alias: bool,
    next_key: u64,
}

/// Recording in-memory stand-in for the whole provider surface.
#[derive(Clone, Default)]
pub struct MockAws {
    state: Arc<Mutex<MockState>>,
}

impl MockAws {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Successful mutations in call order, by provider operation name.
    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.lock().mutations.clear();
    }

    /// Make the next `create-alias` call fail, leaving the key unaliased.
    pub fn fail_create_alias(&self) {
        self.lock().fail_create_alias = true;
    }

    pub fn create_instance_inputs(&self) -> Vec<CreateDbInstance> {
        self.lock().create_instance_inputs.clone()
    }

    pub fn modify_inputs(&self) -> Vec<ModifyDbInstance> {
        self.lock().modify_inputs.clone()
    }

    pub fn delete_inputs(&self) -> Vec<DeleteDbInstance> {
        self.lock().delete_inputs.clone()
    }

    pub fn has_key(&self, alias: &str) -> bool {
        self.lock().aliases.contains_key(alias)
    }

    pub fn has_snapshot(&self, id: &str) -> bool {
        self.lock().snapshots.contains(id)
    }

    /// Plant a key (with its alias) as if created out of band.
    pub fn seed_key(&self, name: &str) {
        let mut state = self.lock();
        let key_id = format!("seeded-{name}");
        state.keys.insert(
            key_id.clone(),
            KeyMetadata {
                key_id: key_id.clone(),
                key_state: Some("Enabled".into()),
                enabled: true,
                ..KeyMetadata::default()
            },
        );
        state.aliases.insert(format!("alias/key-{name}"), key_id);
    }

    pub fn seed_snapshot(&self, id: &str) {
        self.lock().snapshots.insert(id.to_string());
    }

    pub fn seed_bucket(&self, id: &str) {
        self.lock().buckets.insert(id.to_string());
    }

    pub fn set_instance_state(&self, id: &str, state: &str) {
        let mut guard = self.lock();
        if let Some(info) = guard.instances.get_mut(id) {
            info.db_instance_status = Some(state.to_string());
        }
    }
}

impl MockState {
    fn record(&mut self, op: &str) {
        self.mutations.push(op.to_string());
    }

    fn resolve_key(&self, key_id: &str) -> ApiResult<&KeyMetadata> {
        let raw: &str = if key_id.starts_with("alias/") {
            self.aliases
                .get(key_id)
                .map(String::as_str)
                .ok_or_else(|| ApiError::new(codes::KMS_NOT_FOUND, format!("{key_id} not found")))?
        } else {
            key_id
        };
        self.keys
            .get(raw)
            .ok_or_else(|| ApiError::new(codes::KMS_NOT_FOUND, format!("key {raw} not found")))
    }
}

#[async_trait]
impl RdsApi for MockAws {
    async fn create_db_instance(&self, input: CreateDbInstance) -> ApiResult<()> {
        let mut state = self.lock();
        if state.instances.contains_key(&input.db_instance_identifier) {
            return Err(ApiError::new(
                "DBInstanceAlreadyExists",
                format!("instance {} already exists", input.db_instance_identifier),
            ));
        }
        let info = DbInstanceInfo {
            db_instance_identifier: input.db_instance_identifier.clone(),
            db_instance_status: Some("available".into()),
            engine: Some(input.engine.clone()),
            engine_version: Some(input.engine_version.clone()),
            db_instance_class: Some(input.db_instance_class.clone()),
            availability_zone: input.availability_zone.clone(),
            multi_az: input.multi_az.unwrap_or(false),
            storage_encrypted: input.storage_encrypted,
            deletion_protection: input.deletion_protection,
            db_subnet_group: Some(DbSubnetGroupRef {
                db_subnet_group_name: input.db_subnet_group_name.clone(),
            }),
            endpoint: Some(Endpoint {
                address: Some(format!("{}.mock.local", input.db_instance_identifier)),
                port: Some(input.port),
            }),
            db_instance_arn: None,
        };
        state.instances.insert(input.db_instance_identifier.clone(), info);
        state.create_instance_inputs.push(input);
        state.record("CreateDBInstance");
        Ok(())
    }

    async fn describe_db_instances(&self, id: &str) -> ApiResult<Vec<DbInstanceInfo>> {
        let state = self.lock();
        match state.instances.get(id) {
            Some(info) => Ok(vec![info.clone()]),
            None => Err(ApiError::new(
                codes::DB_INSTANCE_NOT_FOUND,
                format!("instance {id} not found"),
            )),
        }
    }

    async fn modify_db_instance(&self, input: ModifyDbInstance) -> ApiResult<()> {
        let mut state = self.lock();
        let Some(info) = state.instances.get_mut(&input.db_instance_identifier) else {
            return Err(ApiError::new(
                codes::DB_INSTANCE_NOT_FOUND,
                format!("instance {} not found", input.db_instance_identifier),
            ));
        };
        if let Some(class) = &input.db_instance_class {
            info.db_instance_class = Some(class.clone());
        }
        if let Some(protection) = input.deletion_protection {
            info.deletion_protection = protection;
        }
        if let Some(multi_az) = input.multi_az {
            info.multi_az = multi_az;
        }
        if let Some(name) = &input.db_subnet_group_name {
            info.db_subnet_group = Some(DbSubnetGroupRef {
                db_subnet_group_name: name.clone(),
            });
        }
        state.modify_inputs.push(input);
        state.record("ModifyDBInstance");
        Ok(())
    }

    async fn delete_db_instance(&self, input: DeleteDbInstance) -> ApiResult<()> {
        let mut state = self.lock();
        if state.instances.remove(&input.db_instance_identifier).is_none() {
            return Err(ApiError::new(
                codes::DB_INSTANCE_NOT_FOUND,
                format!("instance {} not found", input.db_instance_identifier),
            ));
        }
        if !input.skip_final_snapshot {
            if let Some(snapshot) = &input.final_db_snapshot_identifier {
                state.snapshots.insert(snapshot.clone());
            }
        }
        state.delete_inputs.push(input);
        state.record("DeleteDBInstance");
        Ok(())
    }

    async fn restore_db_instance_from_db_snapshot(
        &self,
        input: RestoreDbInstanceFromDbSnapshot,
    ) -> ApiResult<()> {
        let mut state = self.lock();
        if state.instances.contains_key(&input.db_instance_identifier) {
            return Err(ApiError::new(
                "DBInstanceAlreadyExists",
                format!("instance {} already exists", input.db_instance_identifier),
            ));
        }
        if !state.snapshots.contains(&input.db_snapshot_identifier) {
            return Err(ApiError::new(
                codes::DB_SNAPSHOT_NOT_FOUND,
                format!("snapshot {} not found", input.db_snapshot_identifier),
            ));
        }
        let info = DbInstanceInfo {
            db_instance_identifier: input.db_instance_identifier.clone(),
            db_instance_status: Some("available".into()),
            engine: Some(input.engine.clone()),
            db_instance_class: Some(input.db_instance_class.clone()),
            availability_zone: input.availability_zone.clone(),
            multi_az: input.multi_az.unwrap_or(false),
            storage_encrypted: true,
            deletion_protection: input.deletion_protection,
            db_subnet_group: Some(DbSubnetGroupRef {
                db_subnet_group_name: input.db_subnet_group_name.clone(),
            }),
            endpoint: Some(Endpoint {
                address: Some(format!("{}.mock.local", input.db_instance_identifier)),
                port: Some(input.port),
            }),
            ..DbInstanceInfo::default()
        };
        state.instances.insert(input.db_instance_identifier.clone(), info);
        state.record("RestoreDBInstanceFromDBSnapshot");
        Ok(())
    }

    async fn describe_db_snapshots(&self, id: &str) -> ApiResult<Vec<DbSnapshotInfo>> {
        let state = self.lock();
        if state.snapshots.contains(id) {
            Ok(vec![DbSnapshotInfo {
                db_snapshot_identifier: id.to_string(),
                status: Some("available".into()),
                ..DbSnapshotInfo::default()
            }])
        } else {
            Err(ApiError::new(
                codes::DB_SNAPSHOT_NOT_FOUND,
                format!("snapshot {id} not found"),
            ))
        }
    }

    async fn delete_db_snapshot(&self, id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.snapshots.remove(id) {
            return Err(ApiError::new(
                codes::DB_SNAPSHOT_NOT_FOUND,
                format!("snapshot {id} not found"),
            ));
        }
        state.record("DeleteDBSnapshot");
        Ok(())
    }

    async fn create_db_subnet_group(&self, input: CreateDbSubnetGroup) -> ApiResult<()> {
        let mut state = self.lock();
        if state.subnet_groups.contains_key(&input.db_subnet_group_name) {
            return Err(ApiError::new(
                "DBSubnetGroupAlreadyExists",
                format!("subnet group {} already exists", input.db_subnet_group_name),
            ));
        }
        let info = DbSubnetGroupInfo {
            db_subnet_group_name: input.db_subnet_group_name.clone(),
            db_subnet_group_description: Some(input.db_subnet_group_description.clone()),
            subnet_group_status: Some("Complete".into()),
            vpc_id: Some("vpc-mock".into()),
            subnets: input
                .subnet_ids
                .iter()
                .map(|id| SubnetRef {
                    subnet_identifier: id.clone(),
                })
                .collect(),
            db_subnet_group_arn: None,
        };
        state.subnet_groups.insert(input.db_subnet_group_name.clone(), info);
        state.record("CreateDBSubnetGroup");
        Ok(())
    }

    async fn describe_db_subnet_groups(&self, name: &str) -> ApiResult<Vec<DbSubnetGroupInfo>> {
        let state = self.lock();
        match state.subnet_groups.get(name) {
            Some(info) => Ok(vec![info.clone()]),
            None => Err(ApiError::new(
                codes::DB_SUBNET_GROUP_NOT_FOUND,
                format!("subnet group {name} not found"),
            )),
        }
    }

    async fn modify_db_subnet_group(&self, input: ModifyDbSubnetGroup) -> ApiResult<()> {
        let mut state = self.lock();
        let Some(info) = state.subnet_groups.get_mut(&input.db_subnet_group_name) else {
            return Err(ApiError::new(
                codes::DB_SUBNET_GROUP_NOT_FOUND,
                format!("subnet group {} not found", input.db_subnet_group_name),
            ));
        };
        info.db_subnet_group_description = Some(input.db_subnet_group_description.clone());
        info.subnets = input
            .subnet_ids
            .iter()
            .map(|id| SubnetRef {
                subnet_identifier: id.clone(),
            })
            .collect();
        state.record("ModifyDBSubnetGroup");
        Ok(())
    }

    async fn delete_db_subnet_group(&self, name: &str) -> ApiResult<()> {
        let mut state = self.lock();
        if state.subnet_groups.remove(name).is_none() {
            return Err(ApiError::new(
                codes::DB_SUBNET_GROUP_NOT_FOUND,
                format!("subnet group {name} not found"),
            ));
        }
        state.record("DeleteDBSubnetGroup");
        Ok(())
    }
}

#[async_trait]
impl KmsApi for MockAws {
    async fn create_key(&self, _input: CreateKey) -> ApiResult<KeyMetadata> {
        let mut state = self.lock();
        state.next_key += 1;
        let key_id = format!("mock-key-{}", state.next_key);
        let metadata = KeyMetadata {
            key_id: key_id.clone(),
            arn: Some(format!("arn:aws:kms:mock:000000000000:key/{key_id}")),
            key_state: Some("Enabled".into()),
            enabled: true,
            ..KeyMetadata::default()
        };
        state.keys.insert(key_id, metadata.clone());
        state.record("CreateKey");
        Ok(metadata)
    }

    async fn describe_key(&self, key_id: &str) -> ApiResult<KeyMetadata> {
        let state = self.lock();
        state.resolve_key(key_id).cloned()
    }

    async fn create_alias(&self, alias: &str, target_key_id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        if state.fail_create_alias {
            state.fail_create_alias = false;
            return Err(ApiError::new("InternalFailure", "injected alias failure"));
        }
        if !state.keys.contains_key(target_key_id) {
            return Err(ApiError::new(
                codes::KMS_NOT_FOUND,
                format!("key {target_key_id} not found"),
            ));
        }
        state.aliases.insert(alias.to_string(), target_key_id.to_string());
        state.record("CreateAlias");
        Ok(())
    }

    async fn delete_alias(&self, alias: &str) -> ApiResult<()> {
        let mut state = self.lock();
        if state.aliases.remove(alias).is_none() {
            return Err(ApiError::new(
                codes::KMS_NOT_FOUND,
                format!("{alias} not found"),
            ));
        }
        state.record("DeleteAlias");
        Ok(())
    }

    async fn disable_key(&self, key_id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let Some(metadata) = state.keys.get_mut(key_id) else {
            return Err(ApiError::new(
                codes::KMS_NOT_FOUND,
                format!("key {key_id} not found"),
            ));
        };
        metadata.enabled = false;
        metadata.key_state = Some("Disabled".into());
        state.record("DisableKey");
        Ok(())
    }

    async fn schedule_key_deletion(&self, key_id: &str, _pending_window_days: i64) -> ApiResult<()> {
        let mut state = self.lock();
        if state.keys.remove(key_id).is_none() {
            return Err(ApiError::new(
                codes::KMS_NOT_FOUND,
                format!("key {key_id} not found"),
            ));
        }
        state.record("ScheduleKeyDeletion");
        Ok(())
    }
}

#[async_trait]
impl S3Api for MockAws {
    async fn create_bucket(&self, input: CreateBucket) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.insert(input.bucket.clone()) {
            return Err(ApiError::new(
                "BucketAlreadyOwnedByYou",
                format!("bucket {} already exists", input.bucket),
            ));
        }
        state.record("CreateBucket");
        Ok(())
    }

    async fn list_buckets(&self) -> ApiResult<Vec<BucketInfo>> {
        let state = self.lock();
        Ok(state
            .buckets
            .iter()
            .map(|name| BucketInfo { name: name.clone() })
            .collect())
    }

    async fn delete_bucket(&self, bucket: &str) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.remove(bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {bucket} not found"),
            ));
        }
        state.encrypted_buckets.remove(bucket);
        state.record("DeleteBucket");
        Ok(())
    }

    async fn put_bucket_acl(&self, input: PutBucketAcl) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.contains(&input.bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {} not found", input.bucket),
            ));
        }
        state.record("PutBucketAcl");
        Ok(())
    }

    async fn put_bucket_versioning(&self, input: PutBucketVersioning) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.contains(&input.bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {} not found", input.bucket),
            ));
        }
        state.record("PutBucketVersioning");
        Ok(())
    }

    async fn put_bucket_accelerate_configuration(
        &self,
        bucket: &str,
        _enabled: bool,
    ) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.contains(bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {bucket} not found"),
            ));
        }
        state.record("PutBucketAccelerateConfiguration");
        Ok(())
    }

    async fn put_public_access_block(&self, input: PutPublicAccessBlock) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.contains(&input.bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {} not found", input.bucket),
            ));
        }
        state.record("PutPublicAccessBlock");
        Ok(())
    }

    async fn put_bucket_encryption(&self, input: PutBucketEncryption) -> ApiResult<()> {
        let mut state = self.lock();
        if !state.buckets.contains(&input.bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {} not found", input.bucket),
            ));
        }
        state.encrypted_buckets.insert(input.bucket.clone());
        state.record("PutBucketEncryption");
        Ok(())
    }

    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> ApiResult<ServerSideEncryptionConfiguration> {
        let state = self.lock();
        if !state.buckets.contains(bucket) {
            return Err(ApiError::new(
                codes::NO_SUCH_BUCKET,
                format!("bucket {bucket} not found"),
            ));
        }
        if !state.encrypted_buckets.contains(bucket) {
            return Err(ApiError::new(
                codes::NO_ENCRYPTION_CONFIG,
                format!("no encryption configuration on {bucket}"),
            ));
        }
        Ok(ServerSideEncryptionConfiguration {
            rules: vec![serde_json::json!({
                "ApplyServerSideEncryptionByDefault": { "SSEAlgorithm": "aws:kms" }
            })],
        })
    }
}
