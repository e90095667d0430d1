//! S3 cloud objects

pub mod bucket;
pub mod types;

pub use bucket::{Bucket, BucketAcl, BucketSpec, BucketStatus};

/// Topic tag composed into every bucket identifier.
pub const BUCKET_TOPIC: &str = "bkt";
