//! RDS DB subnet group cloud object

use crate::api::{RdsApi, codes};
use crate::rds::types::{CreateDbSubnetGroup, DbSubnetGroupInfo, ModifyDbSubnetGroup};
use crate::rds::{DB_SUBNET_GROUP_TOPIC, compile_tags};
use crate::validate_name;
use async_trait::async_trait;
use cumulus_cloud::{CloudObject, Id, ObjectError, ObjectSpec, Result, Secrets};
use std::collections::BTreeMap;
use std::fmt;

/// Desired state for a subnet group.
#[derive(Debug, Clone, Default)]
pub struct SubnetGroupSpec {
    pub description: String,
    pub subnet_ids: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

impl ObjectSpec for SubnetGroupSpec {
    fn validate(&self) -> Result<()> {
        if self.subnet_ids.is_empty() {
            return Err(ObjectError::SpecInvalid(
                "subnet group needs at least one subnet".to_string(),
            ));
        }
        Ok(())
    }
}

/// Last-observed subnet-group state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroupStatus {
    pub name: String,
    pub state: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub arn: Option<String>,
}

impl From<DbSubnetGroupInfo> for SubnetGroupStatus {
    fn from(info: DbSubnetGroupInfo) -> Self {
        Self {
            name: info.db_subnet_group_name,
            state: info.subnet_group_status,
            vpc_id: info.vpc_id,
            subnet_ids: info
                .subnets
                .into_iter()
                .map(|s| s.subnet_identifier)
                .collect(),
            arn: info.db_subnet_group_arn,
        }
    }
}

impl fmt::Display for SubnetGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subnet group {} state={} subnets={}",
            self.name,
            self.state.as_deref().unwrap_or("unknown"),
            self.subnet_ids.len()
        )
    }
}

/// DB subnet group handle.
pub struct SubnetGroup<C> {
    name: String,
    status: Option<SubnetGroupStatus>,
    client: C,
}

impl<C> SubnetGroup<C>
where
    C: RdsApi + Clone + Send + Sync,
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
}

#[async_trait]
impl<C> CloudObject for SubnetGroup<C>
where
    C: RdsApi + Clone + Send + Sync,
{
    type Spec = SubnetGroupSpec;
    type Status = SubnetGroupStatus;

    async fn create(&mut self, spec: &SubnetGroupSpec) -> Result<Option<Secrets>> {
        if self.exists().await? {
            return Ok(None);
        }

        let input = CreateDbSubnetGroup {
            db_subnet_group_name: self.id().to_string(),
            db_subnet_group_description: spec.description.clone(),
            subnet_ids: spec.subnet_ids.clone(),
            tags: compile_tags(&spec.tags),
        };
        self.client.create_db_subnet_group(input).await?;

        self.read().await?;

        Ok(None)
    }

    async fn read(&mut self) -> Result<()> {
        let groups = match self.client.describe_db_subnet_groups(self.id().as_str()).await {
            Ok(groups) => groups,
            Err(e) if e.is_code(codes::DB_SUBNET_GROUP_NOT_FOUND) => {
                return Err(ObjectError::NotExists(format!(
                    "DB subnet group with id '{}' not found",
                    self.id()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let info = match groups.len() {
            0 => {
                return Err(ObjectError::NotExists(format!(
                    "DB subnet group with id '{}' not found",
                    self.id()
                )));
            }
            1 => groups.into_iter().next().unwrap_or_default(),
            n => {
                return Err(ObjectError::AmbiguousIdentifier(format!(
                    "{n} DB subnet groups match id '{}'",
                    self.id()
                )));
            }
        };
        self.status = Some(info.into());

        Ok(())
    }

    async fn update(&mut self, spec: &SubnetGroupSpec) -> Result<Option<Secrets>> {
        self.read().await?;

        let input = ModifyDbSubnetGroup {
            db_subnet_group_name: self.id().to_string(),
            db_subnet_group_description: spec.description.clone(),
            subnet_ids: spec.subnet_ids.clone(),
        };
        self.client.modify_db_subnet_group(input).await?;

        self.read().await?;

        Ok(None)
    }

    async fn delete(&mut self, _purge: bool) -> Result<()> {
        // Groups hold no data; deletion is unconditional either way.
        match self.client.delete_db_subnet_group(self.id().as_str()).await {
            Ok(()) => {}
            Err(e) if e.is_code(codes::DB_SUBNET_GROUP_NOT_FOUND) => {}
            Err(e) => return Err(e.into()),
        }
        self.status = None;

        Ok(())
    }

    fn id(&self) -> Id {
        Id::derive(DB_SUBNET_GROUP_TOPIC, &self.name)
    }

    fn status(&self) -> Option<&SubnetGroupStatus> {
        self.status.as_ref()
    }
}
