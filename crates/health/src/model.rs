use std::collections::BTreeMap;

use serde::Serialize;

/// Reported service status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Down,
    OutOfService,
    Unknown,
}

/// A health snapshot: status plus free-form details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl Health {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            details: BTreeMap::new(),
        }
    }

    pub fn up() -> Self {
        Self::new(HealthStatus::Up)
    }

    pub fn down() -> Self {
        Self::new(HealthStatus::Down)
    }

    pub fn out_of_service() -> Self {
        Self::new(HealthStatus::OutOfService)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_status_in_upper_snake_case() {
        let json = serde_json::to_value(Health::out_of_service()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "OUT_OF_SERVICE"}));

        let json = serde_json::to_value(Health::down().with_detail("db", "timeout")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "DOWN", "details": {"db": "timeout"}}));
    }
}
