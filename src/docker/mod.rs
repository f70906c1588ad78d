/// Container engine operations
pub mod client;

pub use client::{ContainerEngine, DockerClient};
