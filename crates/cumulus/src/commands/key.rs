use colored::Colorize;
use cumulus_aws::AwsCli;
use cumulus_aws::kms::{Key, KeySpec, KeyType, KeyUsage};
use cumulus_cloud::{Action, CloudObject, handle_object};

pub async fn handle(
    client: AwsCli,
    action: Action,
    name: &str,
    usage: KeyUsage,
    key_type: KeyType,
    purge: bool,
) -> anyhow::Result<()> {
    let mut key = Key::new(name, client)?;
    let spec = KeySpec {
        usage,
        key_type,
        ..KeySpec::default()
    };

    handle_object(&mut key, &spec, action, purge).await?;

    if let Some(status) = key.status() {
        println!("{} {status}", "✓".green());
    } else {
        println!(
            "{} key {} {}",
            "✓".green(),
            key.id().to_string().cyan(),
            super::done(action)
        );
    }

    Ok(())
}
