//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use keel_deployment::DeploymentConfig;
use keel_health::HealthSchedule;

pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub const DATACENTER_OVERRIDE_ENV: &str = "DEPLOYMENT_DATACENTER";
pub const HEALTH_PERIOD_ENV: &str = "HEALTH_CHECK_PERIOD_SECS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub deployment: DeploymentConfig,
    pub health: HealthSchedule,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = var(BIND_ADDR_ENV)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .with_context(|| format!("{BIND_ADDR_ENV} must be a socket address"))?;

        let mut health = HealthSchedule::default();
        if let Some(secs) = var(HEALTH_PERIOD_ENV) {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("{HEALTH_PERIOD_ENV} must be a whole number of seconds"))?;
            health.period = Duration::from_secs(secs.max(1));
        }

        Ok(Self {
            bind_addr,
            deployment: DeploymentConfig {
                name: Some(env!("CARGO_PKG_NAME").to_string()),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
                datacenter: var(DATACENTER_OVERRIDE_ENV),
            },
            health,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.health, HealthSchedule::default());
        assert_eq!(cfg.deployment.name.as_deref(), Some("keel-api"));
        assert_eq!(cfg.deployment.datacenter, None);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            (BIND_ADDR_ENV, "127.0.0.1:9000"),
            (HEALTH_PERIOD_ENV, "30"),
            (DATACENTER_OVERRIDE_ENV, "AmazonECS"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.health.period, Duration::from_secs(30));
        assert_eq!(cfg.deployment.datacenter.as_deref(), Some("AmazonECS"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(config(&[(BIND_ADDR_ENV, "localhost")]).is_err());
        assert!(config(&[(HEALTH_PERIOD_ENV, "soon")]).is_err());
    }
}
