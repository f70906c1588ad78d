/// Cloud provider CLI operations
pub mod client;
pub mod models;

pub use client::{AwsCli, CloudCli};
pub use models::CallerIdentity;
