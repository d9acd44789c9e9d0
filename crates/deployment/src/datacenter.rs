use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::DeploymentError;

/// Kind of datacenter an instance runs in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DatacenterKind {
    SelfHosted,
    CloudVm,
    CloudContainer,
    Private,
}

impl DatacenterKind {
    pub const ALL: [DatacenterKind; 4] = [
        DatacenterKind::Private,
        DatacenterKind::CloudVm,
        DatacenterKind::CloudContainer,
        DatacenterKind::SelfHosted,
    ];

    /// Configured / serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatacenterKind::SelfHosted => "MyOwn",
            DatacenterKind::CloudVm => "Amazon",
            DatacenterKind::CloudContainer => "AmazonECS",
            DatacenterKind::Private => "Private",
        }
    }

    /// Short tag used in the canonical identity string.
    pub fn tag(&self) -> &'static str {
        match self {
            DatacenterKind::SelfHosted => "myown",
            DatacenterKind::CloudVm => "aws",
            DatacenterKind::CloudContainer => "awsecs",
            DatacenterKind::Private => "private",
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            DatacenterKind::SelfHosted => "self-hosted",
            DatacenterKind::CloudVm => "cloud-vm",
            DatacenterKind::CloudContainer => "cloud-container",
            DatacenterKind::Private => "private",
        }
    }

    /// Lookup by configured value or kind name; `None` when unrecognised.
    pub fn lookup(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == value || k.kind_name() == value)
    }
}

impl fmt::Display for DatacenterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatacenterKind {
    type Err = DeploymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| DeploymentError::UnsupportedDatacenter {
            value: s.to_string(),
            supported: Self::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", "),
        })
    }
}

impl Serialize for DatacenterKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_configured_values_and_kind_names() {
        assert_eq!("MyOwn".parse::<DatacenterKind>().unwrap(), DatacenterKind::SelfHosted);
        assert_eq!("AmazonECS".parse::<DatacenterKind>().unwrap(), DatacenterKind::CloudContainer);
        assert_eq!("cloud-vm".parse::<DatacenterKind>().unwrap(), DatacenterKind::CloudVm);
        assert_eq!("private".parse::<DatacenterKind>().unwrap(), DatacenterKind::Private);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(DatacenterKind::lookup("amazon"), None);
    }

    #[test]
    fn unsupported_value_lists_supported_kinds() {
        let err = "Moon".parse::<DatacenterKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "datacenter type 'Moon' is not supported; supported types are: [Private, Amazon, AmazonECS, MyOwn]"
        );
    }
}
