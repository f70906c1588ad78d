/// Helper authentication tool: presence, download and cluster login
pub mod client;
pub mod installer;
pub mod platform;

pub use client::{AuthHelper, KubeAuthHelper};
