//! RDS DB instance cloud object
//!
//! The instance is the one resource here with real lifecycle branching: its
//! create path decides between provisioning a fresh database and restoring the
//! pre-delete snapshot left behind by an earlier non-purging delete. The
//! decision is driven purely by what exists under the derived identifiers, so
//! it survives process restarts without any local state.

use crate::api::{KmsApi, RdsApi, codes};
use crate::kms::{Key, KeySpec};
use crate::rds::types::{
    CreateDbInstance, DbInstanceInfo, DeleteDbInstance, ModifyDbInstance,
    RestoreDbInstanceFromDbSnapshot,
};
use crate::rds::{DB_INSTANCE_TOPIC, PRE_DELETE_SNAPSHOT_TOPIC, compile_tags};
use crate::validate_name;
use async_trait::async_trait;
use cumulus_cloud::{CloudObject, Id, ObjectError, ObjectSpec, Result, Secrets};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Database engine variants this object knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbEngine {
    Mysql,
    #[default]
    Postgres,
    MariaDb,
}

impl DbEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbEngine::Mysql => "mysql",
            DbEngine::Postgres => "postgres",
            DbEngine::MariaDb => "mariadb",
        }
    }
}

impl FromStr for DbEngine {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mysql" => Ok(DbEngine::Mysql),
            "postgres" => Ok(DbEngine::Postgres),
            "mariadb" => Ok(DbEngine::MariaDb),
            other => Err(ObjectError::OptsInvalid(format!("unknown engine '{other}'"))),
        }
    }
}

impl fmt::Display for DbEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage class backing the instance volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageType {
    Standard,
    Io1,
    #[default]
    Gp2,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Standard => "standard",
            StorageType::Io1 => "io1",
            StorageType::Gp2 => "gp2",
        }
    }
}

impl FromStr for StorageType {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(StorageType::Standard),
            "io1" => Ok(StorageType::Io1),
            "gp2" => Ok(StorageType::Gp2),
            other => Err(ObjectError::OptsInvalid(format!(
                "unknown storage type '{other}'"
            ))),
        }
    }
}

/// Volume sizing and encryption settings.
#[derive(Debug, Clone)]
pub struct StorageSpec {
    pub allocated: i64,
    pub max_allocated: i64,
    pub iops: Option<i64>,
    pub encrypted: bool,
    pub storage_type: StorageType,
}

impl Default for StorageSpec {
    fn default() -> Self {
        Self {
            allocated: 20,
            max_allocated: 100,
            iops: None,
            encrypted: true,
            storage_type: StorageType::Gp2,
        }
    }
}

/// Enhanced-monitoring settings; absent means monitoring stays off.
#[derive(Debug, Clone)]
pub struct MonitoringSpec {
    pub interval: i64,
    pub role_arn: String,
}

/// Performance-insights settings; absent means the feature stays off.
#[derive(Debug, Clone)]
pub struct PerformanceInsightsSpec {
    pub retention_period: i64,
}

/// Desired state for a DB instance.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub auto_minor_version_upgrade: bool,
    /// Pinned availability zone. `None` requests a multi-AZ deployment.
    pub availability_zone: Option<String>,
    pub backup_retention_period: i64,
    pub db_instance_class: String,
    pub db_name: String,
    pub db_subnet_group_name: String,
    pub engine: DbEngine,
    pub engine_version: String,
    pub master_username: String,
    pub master_user_password: String,
    pub monitoring: Option<MonitoringSpec>,
    pub performance_insights: Option<PerformanceInsightsSpec>,
    pub port: i64,
    pub preferred_backup_window: String,
    pub preferred_maintenance_window: String,
    pub publicly_accessible: bool,
    /// Whether create may restore from a leftover pre-delete snapshot.
    pub restoration_enabled: bool,
    pub storage: StorageSpec,
    pub tags: BTreeMap<String, String>,
    pub vpc_security_group_ids: Vec<String>,
}

impl Default for InstanceSpec {
    fn default() -> Self {
        Self {
            auto_minor_version_upgrade: true,
            availability_zone: None,
            backup_retention_period: 14,
            db_instance_class: String::new(),
            db_name: String::new(),
            db_subnet_group_name: String::new(),
            engine: DbEngine::Postgres,
            engine_version: String::new(),
            master_username: String::new(),
            master_user_password: String::new(),
            monitoring: None,
            performance_insights: None,
            port: 5432,
            preferred_backup_window: String::new(),
            preferred_maintenance_window: String::new(),
            publicly_accessible: false,
            restoration_enabled: true,
            storage: StorageSpec::default(),
            tags: BTreeMap::new(),
            vpc_security_group_ids: Vec::new(),
        }
    }
}

impl ObjectSpec for InstanceSpec {
    fn validate(&self) -> Result<()> {
        if self.db_name.is_empty() {
            return Err(ObjectError::SpecInvalid("database name is empty".to_string()));
        }
        if self.master_username.is_empty() || self.master_username.len() > 16 {
            return Err(ObjectError::SpecInvalid(
                "master username must be 1 to 16 characters".to_string(),
            ));
        }
        if self.master_user_password.is_empty() || self.master_user_password.len() > 41 {
            return Err(ObjectError::SpecInvalid(
                "master password must be 1 to 41 characters".to_string(),
            ));
        }
        Ok(())
    }
}

impl InstanceSpec {
    /// Multi-AZ is the complement of pinning a zone.
    fn multi_az(&self) -> Option<bool> {
        self.availability_zone.is_none().then_some(true)
    }

    /// Provisioned IOPS only applies to the io1 storage class.
    fn iops(&self) -> Option<i64> {
        match self.storage.storage_type {
            StorageType::Io1 => self.storage.iops,
            _ => None,
        }
    }

    fn create_input(&self, id: &Id, kms_key_id: &Id) -> CreateDbInstance {
        CreateDbInstance {
            db_instance_identifier: id.to_string(),
            db_instance_class: self.db_instance_class.clone(),
            db_name: self.db_name.clone(),
            db_subnet_group_name: self.db_subnet_group_name.clone(),
            engine: self.engine.as_str().to_string(),
            engine_version: self.engine_version.clone(),
            master_username: self.master_username.clone(),
            master_user_password: self.master_user_password.clone(),
            port: self.port,
            backup_retention_period: self.backup_retention_period,
            preferred_backup_window: self.preferred_backup_window.clone(),
            preferred_maintenance_window: self.preferred_maintenance_window.clone(),
            publicly_accessible: self.publicly_accessible,
            auto_minor_version_upgrade: self.auto_minor_version_upgrade,
            copy_tags_to_snapshot: true,
            deletion_protection: true,
            storage_type: self.storage.storage_type.as_str().to_string(),
            allocated_storage: self.storage.allocated,
            max_allocated_storage: self.storage.max_allocated,
            storage_encrypted: self.storage.encrypted,
            iops: self.iops(),
            kms_key_id: self.storage.encrypted.then(|| kms_key_id.to_string()),
            availability_zone: self.availability_zone.clone(),
            multi_az: self.multi_az(),
            monitoring_interval: self.monitoring.as_ref().map(|m| m.interval),
            monitoring_role_arn: self.monitoring.as_ref().map(|m| m.role_arn.clone()),
            enable_performance_insights: self.performance_insights.as_ref().map(|_| true),
            performance_insights_retention_period: self
                .performance_insights
                .as_ref()
                .map(|p| p.retention_period),
            vpc_security_group_ids: self.vpc_security_group_ids.clone(),
            tags: compile_tags(&self.tags),
        }
    }

    fn restore_input(&self, id: &Id, snapshot_id: &Id) -> RestoreDbInstanceFromDbSnapshot {
        RestoreDbInstanceFromDbSnapshot {
            db_instance_identifier: id.to_string(),
            db_snapshot_identifier: snapshot_id.to_string(),
            db_instance_class: self.db_instance_class.clone(),
            db_name: self.db_name.clone(),
            db_subnet_group_name: self.db_subnet_group_name.clone(),
            engine: self.engine.as_str().to_string(),
            port: self.port,
            publicly_accessible: self.publicly_accessible,
            auto_minor_version_upgrade: self.auto_minor_version_upgrade,
            copy_tags_to_snapshot: true,
            deletion_protection: true,
            storage_type: self.storage.storage_type.as_str().to_string(),
            iops: self.iops(),
            availability_zone: self.availability_zone.clone(),
            multi_az: self.multi_az(),
            vpc_security_group_ids: self.vpc_security_group_ids.clone(),
            tags: compile_tags(&self.tags),
        }
    }

    fn modify_input(&self, id: &Id) -> ModifyDbInstance {
        ModifyDbInstance {
            db_instance_identifier: id.to_string(),
            apply_immediately: true,
            db_instance_class: Some(self.db_instance_class.clone()),
            db_subnet_group_name: Some(self.db_subnet_group_name.clone()),
            engine_version: Some(self.engine_version.clone()),
            master_user_password: Some(self.master_user_password.clone()),
            backup_retention_period: Some(self.backup_retention_period),
            preferred_backup_window: Some(self.preferred_backup_window.clone()),
            preferred_maintenance_window: Some(self.preferred_maintenance_window.clone()),
            publicly_accessible: Some(self.publicly_accessible),
            auto_minor_version_upgrade: Some(self.auto_minor_version_upgrade),
            copy_tags_to_snapshot: Some(true),
            deletion_protection: Some(true),
            storage_type: Some(self.storage.storage_type.as_str().to_string()),
            allocated_storage: Some(self.storage.allocated),
            max_allocated_storage: Some(self.storage.max_allocated),
            iops: self.iops(),
            multi_az: self.multi_az(),
            monitoring_interval: self.monitoring.as_ref().map(|m| m.interval),
            monitoring_role_arn: self.monitoring.as_ref().map(|m| m.role_arn.clone()),
            enable_performance_insights: self.performance_insights.as_ref().map(|_| true),
            performance_insights_retention_period: self
                .performance_insights
                .as_ref()
                .map(|p| p.retention_period),
            vpc_security_group_ids: Some(self.vpc_security_group_ids.clone()),
        }
    }
}

/// Coarse lifecycle state, parsed from the provider's free-form status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Available,
    Creating,
    Deleting,
    Other(String),
}

impl InstanceState {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("available") => InstanceState::Available,
            Some("creating") => InstanceState::Creating,
            Some("deleting") => InstanceState::Deleting,
            Some(other) => InstanceState::Other(other.to_string()),
            None => InstanceState::Other("unknown".to_string()),
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Available => f.write_str("available"),
            InstanceState::Creating => f.write_str("creating"),
            InstanceState::Deleting => f.write_str("deleting"),
            InstanceState::Other(s) => f.write_str(s),
        }
    }
}

/// Last-observed instance state, decoupled from the wire schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatus {
    pub id: String,
    pub state: InstanceState,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub instance_class: Option<String>,
    pub availability_zone: Option<String>,
    pub multi_az: bool,
    pub storage_encrypted: bool,
    pub deletion_protection: bool,
    pub subnet_group: Option<String>,
    pub endpoint: Option<String>,
    pub port: Option<i64>,
    pub arn: Option<String>,
}

impl From<DbInstanceInfo> for InstanceStatus {
    fn from(info: DbInstanceInfo) -> Self {
        let (endpoint, port) = info
            .endpoint
            .map(|e| (e.address, e.port))
            .unwrap_or((None, None));
        Self {
            id: info.db_instance_identifier,
            state: InstanceState::parse(info.db_instance_status.as_deref()),
            engine: info.engine,
            engine_version: info.engine_version,
            instance_class: info.db_instance_class,
            availability_zone: info.availability_zone,
            multi_az: info.multi_az,
            storage_encrypted: info.storage_encrypted,
            deletion_protection: info.deletion_protection,
            subnet_group: info.db_subnet_group.map(|g| g.db_subnet_group_name),
            endpoint,
            port,
            arn: info.db_instance_arn,
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance {} state={}", self.id, self.state)?;
        if let Some(endpoint) = &self.endpoint {
            write!(f, " endpoint={endpoint}")?;
            if let Some(port) = self.port {
                write!(f, ":{port}")?;
            }
        }
        Ok(())
    }
}

/// DB instance handle, owning the encryption key under the same logical name.
pub struct Instance<C> {
    name: String,
    status: Option<InstanceStatus>,
    client: C,
}

impl<C> Instance<C>
where
    C: RdsApi + KmsApi + Clone + Send + Sync,
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

    /// The pre-delete snapshot id, derived from the instance id so a future
    /// create can recompute it from the name alone.
    pub fn snapshot_id(&self) -> Id {
        Id::derive(PRE_DELETE_SNAPSHOT_TOPIC, self.id().as_str())
    }

    fn key(&self) -> Result<Key<C>> {
        Key::new(self.name.clone(), self.client.clone())
    }

    /// Probe for this instance's pre-delete snapshot.
    async fn snapshot_exists(&self) -> Result<bool> {
        let snapshots = match self.client.describe_db_snapshots(self.snapshot_id().as_str()).await {
            Ok(snapshots) => snapshots,
            Err(e) if e.is_code(codes::DB_SNAPSHOT_NOT_FOUND) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        match snapshots.len() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(ObjectError::AmbiguousIdentifier(format!(
                "{n} DB snapshots match id '{}'",
                self.snapshot_id()
            ))),
        }
    }
}

#[async_trait]
impl<C> CloudObject for Instance<C>
where
    C: RdsApi + KmsApi + Clone + Send + Sync,
{
    type Spec = InstanceSpec;
    type Status = InstanceStatus;

    async fn create(&mut self, spec: &InstanceSpec) -> Result<Option<Secrets>> {
        if self.exists().await? {
            return Ok(None);
        }

        let mut key = self.key()?;
        let key_found = key.exists().await?;
        let snapshot_found = self.snapshot_exists().await?;

        match (key_found, snapshot_found) {
            (true, true) => {
                // Both recovery artifacts from an earlier non-purging delete
                // are present; the only correct move is to restore them.
                if !spec.restoration_enabled {
                    return Err(ObjectError::RestorationDisabled(format!(
                        "recovery artifacts exist for '{}' but restoration is disabled",
                        self.id()
                    )));
                }
                tracing::info!(id = %self.id(), snapshot = %self.snapshot_id(), "restoring instance from pre-delete snapshot");
                self.client
                    .restore_db_instance_from_db_snapshot(
                        spec.restore_input(&self.id(), &self.snapshot_id()),
                    )
                    .await?;
            }
            (false, false) => {
                tracing::info!(id = %self.id(), "creating fresh instance");
                key.create(&KeySpec {
                    tags: spec.tags.clone(),
                    ..KeySpec::default()
                })
                .await?;
                self.client
                    .create_db_instance(spec.create_input(&self.id(), &key.id()))
                    .await?;
            }
            (true, false) => {
                return Err(ObjectError::IdCollision(format!(
                    "key '{}' exists without a matching snapshot '{}'",
                    key.id(),
                    self.snapshot_id()
                )));
            }
            (false, true) => {
                return Err(ObjectError::IdCollision(format!(
                    "snapshot '{}' exists without a matching key '{}'",
                    self.snapshot_id(),
                    key.id()
                )));
            }
        }

        self.read().await?;

        Ok(None)
    }

    async fn read(&mut self) -> Result<()> {
        let instances = match self.client.describe_db_instances(self.id().as_str()).await {
            Ok(instances) => instances,
            Err(e) if e.is_code(codes::DB_INSTANCE_NOT_FOUND) => {
                return Err(ObjectError::NotExists(format!(
                    "DB instance with id '{}' not found",
                    self.id()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let info = match instances.len() {
            0 => {
                return Err(ObjectError::NotExists(format!(
                    "DB instance with id '{}' not found",
                    self.id()
                )));
            }
            1 => instances.into_iter().next().unwrap_or_default(),
            n => {
                return Err(ObjectError::AmbiguousIdentifier(format!(
                    "{n} DB instances match id '{}'",
                    self.id()
                )));
            }
        };
        self.status = Some(info.into());

        Ok(())
    }

    async fn update(&mut self, spec: &InstanceSpec) -> Result<Option<Secrets>> {
        self.read().await?;
        let status = match &self.status {
            Some(status) => status,
            None => {
                return Err(ObjectError::NotExists(format!(
                    "DB instance with id '{}' not found",
                    self.id()
                )));
            }
        };

        // Topology and encryption changes cannot be applied in place; reject
        // them before any provider call is made. Both directions of the
        // single-AZ/multi-AZ switch are mutations, and the modify request has
        // no way to move a pinned zone at all.
        if spec.availability_zone.is_none() != status.multi_az {
            return Err(ObjectError::SpecInvalid(
                "deployment topology (single-AZ vs multi-AZ) cannot be changed after creation"
                    .to_string(),
            ));
        }
        if let Some(zone) = &spec.availability_zone {
            if status.availability_zone.as_deref() != Some(zone.as_str()) {
                return Err(ObjectError::SpecInvalid(format!(
                    "a pinned availability zone cannot be moved to '{zone}'"
                )));
            }
        }
        if spec.storage.encrypted != status.storage_encrypted {
            return Err(ObjectError::SpecInvalid(
                "storage encryption cannot be changed after creation".to_string(),
            ));
        }
        if status.multi_az
            && status.subnet_group.as_deref() != Some(spec.db_subnet_group_name.as_str())
        {
            return Err(ObjectError::SpecInvalid(
                "cannot move a multi-AZ instance to another subnet group".to_string(),
            ));
        }

        self.client.modify_db_instance(spec.modify_input(&self.id())).await?;

        self.read().await?;

        Ok(None)
    }

    async fn delete(&mut self, purge: bool) -> Result<()> {
        match self.read().await {
            Ok(()) => {}
            Err(e) if e.is_not_exists() => {
                return Err(ObjectError::NotExists(format!(
                    "cannot delete non-existing DB instance '{}'",
                    self.id()
                )));
            }
            Err(e) => return Err(e),
        }
        let status = match &self.status {
            Some(status) => status.clone(),
            None => {
                return Err(ObjectError::NotExists(format!(
                    "cannot delete non-existing DB instance '{}'",
                    self.id()
                )));
            }
        };

        match status.state {
            InstanceState::Deleting => return Ok(()),
            InstanceState::Available => {}
            other => {
                return Err(ObjectError::NotReady(format!(
                    "DB instance '{}' is {other}, not available",
                    self.id()
                )));
            }
        }

        // A leftover snapshot under the derived id would collide with the
        // final snapshot taken below, and a purge must not leave it behind.
        if self.snapshot_exists().await? {
            tracing::info!(snapshot = %self.snapshot_id(), "removing stale pre-delete snapshot");
            self.client.delete_db_snapshot(self.snapshot_id().as_str()).await?;
        }

        if status.deletion_protection {
            self.client
                .modify_db_instance(ModifyDbInstance::deletion_protection(
                    self.id().as_str(),
                    false,
                ))
                .await?;
        }

        let input = DeleteDbInstance {
            db_instance_identifier: self.id().to_string(),
            skip_final_snapshot: purge,
            delete_automated_backups: purge,
            final_db_snapshot_identifier: (!purge).then(|| self.snapshot_id().to_string()),
        };
        tracing::info!(id = %self.id(), purge, "deleting instance");
        match self.client.delete_db_instance(input).await {
            Ok(()) => {}
            Err(e) if e.is_code(codes::DB_INSTANCE_NOT_FOUND) => {}
            Err(e) => return Err(e.into()),
        }

        // Purging leaves nothing to restore, so the key goes with the data.
        if purge {
            self.key()?.delete(true).await?;
        }

        self.status = None;

        Ok(())
    }

    fn id(&self) -> Id {
        Id::derive(DB_INSTANCE_TOPIC, &self.name)
    }

    fn status(&self) -> Option<&InstanceStatus> {
        self.status.as_ref()
    }
}
