use colored::Colorize;
use cumulus_aws::AwsCli;
use cumulus_aws::rds::{SubnetGroup, SubnetGroupSpec};
use cumulus_cloud::{Action, CloudObject, handle_object};
use std::collections::BTreeMap;

pub async fn handle(
    client: AwsCli,
    action: Action,
    name: &str,
    subnets: Vec<String>,
    description: String,
    purge: bool,
) -> anyhow::Result<()> {
    let mut group = SubnetGroup::new(name, client)?;
    let spec = SubnetGroupSpec {
        description,
        subnet_ids: subnets,
        tags: BTreeMap::new(),
    };

    handle_object(&mut group, &spec, action, purge).await?;

    if let Some(status) = group.status() {
        println!("{} {status}", "✓".green());
    } else {
        println!(
            "{} subnet group {} {}",
            "✓".green(),
            group.id().to_string().cyan(),
            super::done(action)
        );
    }

    Ok(())
}
