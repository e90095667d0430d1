use colored::Colorize;
use cumulus_aws::AwsCli;
use cumulus_aws::rds::{DB_SUBNET_GROUP_TOPIC, Instance, defaults};
use cumulus_cloud::{Action, CloudObject, Id, handle_object};
use std::collections::BTreeMap;

pub struct Opts {
    pub class: String,
    pub db_name: Option<String>,
    pub subnet_group: String,
    pub username: String,
    pub password: String,
    pub security_groups: Vec<String>,
    pub no_restore: bool,
}

pub async fn handle(
    client: AwsCli,
    action: Action,
    name: &str,
    opts: Opts,
    purge: bool,
) -> anyhow::Result<()> {
    let mut instance = Instance::new(name, client)?;

    // The flag carries the subnet group's logical name; resolve it to the
    // provider-facing identifier the same way the subnet-group command does.
    let subnet_group_id = Id::derive(DB_SUBNET_GROUP_TOPIC, &opts.subnet_group);

    let mut spec = defaults::sane_postgres(
        opts.class,
        opts.db_name.unwrap_or_else(|| name.to_string()),
        subnet_group_id.to_string(),
        opts.username,
        opts.password,
        BTreeMap::new(),
        opts.security_groups,
    );
    spec.restoration_enabled = !opts.no_restore;

    handle_object(&mut instance, &spec, action, purge).await?;

    if let Some(status) = instance.status() {
        println!("{} {status}", "✓".green());
    } else {
        println!(
            "{} instance {} {}",
            "✓".green(),
            instance.id().to_string().cyan(),
            super::done(action)
        );
    }

    Ok(())
}
