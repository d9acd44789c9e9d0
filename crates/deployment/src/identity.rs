//! Deployment identity resolution.
//!
//! Name and version come from explicit configuration when given, otherwise
//! from the environment. The datacenter kind follows the same order with a
//! fixed default; environment and region are environment-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use crate::{DatacenterKind, DeploymentError};

pub const ENV_APP_NAME: &str = "CLOUD_APP";
pub const ENV_APP_VERSION: &str = "CLOUD_APP_VERSION";
pub const ENV_DATACENTER: &str = "CLOUD_DATACENTER";
pub const ENV_ENVIRONMENT: &str = "CLOUD_ENVIRONMENT";
pub const ENV_REGION: &str = "EC2_REGION";

pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_DATACENTER: DatacenterKind = DatacenterKind::SelfHosted;

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Explicit overrides, typically from application metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Datacenter override; must name a supported kind when non-empty.
    pub datacenter: Option<String>,
}

/// Identity of the running service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentIdentity {
    name: Option<String>,
    version: Option<String>,
    datacenter: Option<DatacenterKind>,
    environment: String,
    region: String,
}

impl DeploymentIdentity {
    /// Identity with default datacenter, environment and region.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            datacenter: Some(DEFAULT_DATACENTER),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn with_datacenter(mut self, datacenter: Option<DatacenterKind>) -> Self {
        self.datacenter = datacenter;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Resolve from explicit config and the given environment.
    pub fn resolve(config: &DeploymentConfig, env: &dyn EnvSource) -> Result<Self, DeploymentError> {
        let datacenter = match config.datacenter.as_deref().filter(|v| !v.is_empty()) {
            Some(value) => Some(value.parse::<DatacenterKind>()?),
            None => match env.var(ENV_DATACENTER) {
                // Unrecognised env values fall back to the short identity form.
                Some(value) => DatacenterKind::lookup(&value),
                None => Some(DEFAULT_DATACENTER),
            },
        };

        Ok(Self {
            name: config.name.clone().or_else(|| env.var(ENV_APP_NAME)),
            version: config.version.clone().or_else(|| env.var(ENV_APP_VERSION)),
            datacenter,
            environment: env
                .var(ENV_ENVIRONMENT)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            region: env.var(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }

    /// Resolve from explicit config and the process environment.
    pub fn from_env(config: &DeploymentConfig) -> Result<Self, DeploymentError> {
        Self::resolve(config, &SystemEnv)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn datacenter(&self) -> Option<DatacenterKind> {
        self.datacenter
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// `{tag}:{environment}:{region}:{name}:{version}`, or `{name}:{version}`
    /// when no datacenter kind is known.
    pub fn canonical(&self) -> String {
        let name = self.name.as_deref().unwrap_or_default();
        let version = self.version.as_deref().unwrap_or_default();

        match self.datacenter {
            Some(kind) => format!(
                "{}:{}:{}:{}:{}",
                kind.tag(),
                self.environment,
                self.region,
                name,
                version
            ),
            None => format!("{name}:{version}"),
        }
    }
}

impl fmt::Display for DeploymentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Resolves the identity on first access and caches the outcome, including
/// a configuration error, for the lifetime of the provider.
pub struct DeploymentProvider {
    config: DeploymentConfig,
    env: Box<dyn EnvSource>,
    resolved: OnceLock<Result<Arc<DeploymentIdentity>, DeploymentError>>,
}

impl DeploymentProvider {
    pub fn new(config: DeploymentConfig) -> Self {
        Self::with_env(config, SystemEnv)
    }

    pub fn with_env(config: DeploymentConfig, env: impl EnvSource + 'static) -> Self {
        Self {
            config,
            env: Box::new(env),
            resolved: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<Arc<DeploymentIdentity>, DeploymentError> {
        self.resolved
            .get_or_init(|| match DeploymentIdentity::resolve(&self.config, self.env.as_ref()) {
                Ok(identity) => {
                    tracing::info!(identity = %identity, "resolved deployment identity");
                    Ok(Arc::new(identity))
                }
                Err(err) => {
                    tracing::error!(error = %err, "invalid deployment configuration");
                    Err(err)
                }
            })
            .clone()
    }
}

impl fmt::Debug for DeploymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentProvider")
            .field("config", &self.config)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
