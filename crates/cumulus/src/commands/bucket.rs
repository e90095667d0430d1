use colored::Colorize;
use cumulus_aws::AwsCli;
use cumulus_aws::s3::{Bucket, BucketAcl, BucketSpec};
use cumulus_cloud::{Action, CloudObject, handle_object};

pub struct Opts {
    pub location: Option<String>,
    pub acl: BucketAcl,
    pub object_lock: bool,
    pub versioning: bool,
    pub accelerate: bool,
}

pub async fn handle(
    client: AwsCli,
    action: Action,
    name: &str,
    opts: Opts,
    purge: bool,
) -> anyhow::Result<()> {
    let mut bucket = Bucket::new(name, client)?;
    let spec = BucketSpec {
        location: opts.location.unwrap_or_default(),
        acl: opts.acl,
        object_lock: opts.object_lock,
        versioning: opts.versioning,
        transfer_acceleration: opts.accelerate,
        ..BucketSpec::default()
    };

    handle_object(&mut bucket, &spec, action, purge).await?;

    if let Some(status) = bucket.status() {
        println!("{} {status}", "✓".green());
    } else {
        println!(
            "{} bucket {} {}",
            "✓".green(),
            bucket.id().to_string().cyan(),
            super::done(action)
        );
    }

    Ok(())
}
