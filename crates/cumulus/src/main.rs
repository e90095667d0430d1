mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use cumulus_aws::kms::{KeyType, KeyUsage};
use cumulus_aws::s3::BucketAcl;
use cumulus_aws::{AwsCli, AwsConfig};
use cumulus_cloud::Action;

#[derive(Parser)]
#[command(name = "cumulus")]
#[command(about = "Declarative lifecycle management for AWS resources", long_about = None)]
struct Cli {
    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// AWS credentials profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// On delete, also remove backups and encryption keys
    #[arg(long, global = true)]
    purge: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage an RDS database instance (with its encryption key)
    Instance {
        /// Lifecycle action (create, read, update, delete)
        action: Action,
        /// Logical name of the instance
        name: String,
        /// Instance class
        #[arg(long, default_value = "db.t3.small")]
        class: String,
        /// Name of the initial database
        #[arg(long)]
        db_name: Option<String>,
        /// Logical name of the subnet group to place the instance in
        #[arg(long)]
        subnet_group: String,
        /// Master username
        #[arg(long, default_value = "root")]
        username: String,
        /// Master password
        #[arg(long, env = "CUMULUS_DB_PASSWORD")]
        password: String,
        /// VPC security group id (repeatable)
        #[arg(long = "security-group")]
        security_groups: Vec<String>,
        /// Refuse to restore from a leftover pre-delete snapshot
        #[arg(long)]
        no_restore: bool,
    },
    /// Manage a KMS encryption key
    Key {
        /// Lifecycle action (create, read, update, delete)
        action: Action,
        /// Logical name of the key
        name: String,
        /// Key usage (ENCRYPT_DECRYPT, SIGN_VERIFY)
        #[arg(long, default_value = "ENCRYPT_DECRYPT")]
        usage: KeyUsage,
        /// Key material type (SYMMETRIC_DEFAULT, RSA_2048, ...)
        #[arg(long = "key-type", default_value = "SYMMETRIC_DEFAULT")]
        key_type: KeyType,
    },
    /// Manage an RDS DB subnet group
    SubnetGroup {
        /// Lifecycle action (create, read, update, delete)
        action: Action,
        /// Logical name of the subnet group
        name: String,
        /// Subnet id to include (repeatable)
        #[arg(long = "subnet")]
        subnets: Vec<String>,
        /// Human-readable description
        #[arg(long, default_value = "managed by cumulus")]
        description: String,
    },
    /// Manage an encrypted S3 bucket (with its encryption key)
    Bucket {
        /// Lifecycle action (create, read, update, delete)
        action: Action,
        /// Logical name of the bucket
        name: String,
        /// Region constraint for the bucket location
        #[arg(long)]
        location: Option<String>,
        /// Canned ACL (private, public-read, ...)
        #[arg(long, default_value = "private")]
        acl: BucketAcl,
        /// Enable S3 object lock on creation
        #[arg(long)]
        object_lock: bool,
        /// Disable object versioning
        #[arg(long)]
        no_versioning: bool,
        /// Enable transfer acceleration
        #[arg(long)]
        accelerate: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = AwsCli::new(AwsConfig {
        region: cli.region.clone(),
        profile: cli.profile.clone(),
    });

    let result = match cli.command {
        Commands::Instance {
            action,
            name,
            class,
            db_name,
            subnet_group,
            username,
            password,
            security_groups,
            no_restore,
        } => {
            commands::instance::handle(
                client,
                action,
                &name,
                commands::instance::Opts {
                    class,
                    db_name,
                    subnet_group,
                    username,
                    password,
                    security_groups,
                    no_restore,
                },
                cli.purge,
            )
            .await
        }
        Commands::Key {
            action,
            name,
            usage,
            key_type,
        } => commands::key::handle(client, action, &name, usage, key_type, cli.purge).await,
        Commands::SubnetGroup {
            action,
            name,
            subnets,
            description,
        } => {
            commands::subnet_group::handle(client, action, &name, subnets, description, cli.purge)
                .await
        }
        Commands::Bucket {
            action,
            name,
            location,
            acl,
            object_lock,
            no_versioning,
            accelerate,
        } => {
            commands::bucket::handle(
                client,
                action,
                &name,
                commands::bucket::Opts {
                    location,
                    acl,
                    object_lock,
                    versioning: !no_versioning,
                    accelerate,
                },
                cli.purge,
            )
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}
