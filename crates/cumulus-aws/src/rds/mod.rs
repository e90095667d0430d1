//! RDS cloud objects

pub mod defaults;
pub mod instance;
pub mod subnet_group;
pub mod types;

pub use instance::{
    DbEngine, Instance, InstanceSpec, InstanceState, InstanceStatus, MonitoringSpec,
    PerformanceInsightsSpec, StorageSpec, StorageType,
};
pub use subnet_group::{SubnetGroup, SubnetGroupSpec, SubnetGroupStatus};

/// Topic tag composed into every instance identifier.
pub const DB_INSTANCE_TOPIC: &str = "db";

/// Topic tag for the snapshot taken right before an instance is deleted. The
/// snapshot id is derived from the instance id, not the logical name, so a
/// restore can find it from the name alone.
pub const PRE_DELETE_SNAPSHOT_TOPIC: &str = "predelete";

/// Topic tag composed into every subnet-group identifier.
pub const DB_SUBNET_GROUP_TOPIC: &str = "sg";

/// Flatten a tag map into the provider's key/value list shape.
pub(crate) fn compile_tags(
    tags: &std::collections::BTreeMap<String, String>,
) -> Vec<types::Tag> {
    tags.iter()
        .map(|(k, v)| types::Tag {
            key: k.clone(),
            value: v.clone(),
        })
        .collect()
}
