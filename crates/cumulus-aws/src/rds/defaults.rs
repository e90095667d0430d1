//! Opinionated instance presets

use crate::rds::instance::InstanceSpec;
use std::collections::BTreeMap;

/// A sane production Postgres: encrypted gp2 storage, multi-AZ, nightly
/// backups kept for two weeks, maintenance on Sunday nights.
pub fn sane_postgres(
    instance_class: impl Into<String>,
    db_name: impl Into<String>,
    subnet_group_name: impl Into<String>,
    master_username: impl Into<String>,
    master_user_password: impl Into<String>,
    tags: BTreeMap<String, String>,
    vpc_security_group_ids: Vec<String>,
) -> InstanceSpec {
    InstanceSpec {
        db_instance_class: instance_class.into(),
        db_name: db_name.into(),
        db_subnet_group_name: subnet_group_name.into(),
        engine_version: "12.2".to_string(),
        master_username: master_username.into(),
        master_user_password: master_user_password.into(),
        preferred_backup_window: "01:00-02:00".to_string(),
        preferred_maintenance_window: "Sun:02:00-Sun:03:00".to_string(),
        tags,
        vpc_security_group_ids,
        ..InstanceSpec::default()
    }
}
