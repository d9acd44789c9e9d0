//! `keel-deployment`: identity of the running service instance
//! (name, version, datacenter, environment, region).

pub mod datacenter;
pub mod error;
pub mod identity;

pub use datacenter::DatacenterKind;
pub use error::DeploymentError;
pub use identity::{DeploymentConfig, DeploymentIdentity, DeploymentProvider, EnvSource, SystemEnv};
