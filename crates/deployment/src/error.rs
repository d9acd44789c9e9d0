use thiserror::Error;

/// Deployment configuration errors. These are startup failures, not
/// request-time errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeploymentError {
    #[error("datacenter type '{value}' is not supported; supported types are: [{supported}]")]
    UnsupportedDatacenter { value: String, supported: String },
}
