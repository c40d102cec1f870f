//! Relation roles and catalog keys

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side of a relation interface whose databag a schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Provider,
    Requirer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Provider, Role::Requirer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Provider => "provider",
            Role::Requirer => "requirer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provider" => Ok(Role::Provider),
            "requirer" => Ok(Role::Requirer),
            other => Err(format!("Invalid role: '{}'. Must be 'provider' or 'requirer'.", other)),
        }
    }
}

/// Databag owner within one side of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabagScope {
    App,
    Unit,
}

impl DatabagScope {
    pub const ALL: [DatabagScope; 2] = [DatabagScope::App, DatabagScope::Unit];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabagScope::App => "app",
            DatabagScope::Unit => "unit",
        }
    }
}

/// Identifies one schema in a catalog: interface name, major version, role
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceKey {
    pub name: String,
    pub version: u32,
    pub role: Role,
}

impl InterfaceKey {
    pub fn new(name: impl Into<String>, version: u32, role: Role) -> Self {
        Self {
            name: name.into(),
            version,
            role,
        }
    }
}

impl fmt::Display for InterfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/v{}/{}", self.name, self.version, self.role)
    }
}

impl FromStr for InterfaceKey {
    type Err = String;

    /// Parses `name/vN/role`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        let [name, version, role] = parts.as_slice() else {
            return Err(format!("Invalid interface key '{}': expected name/vN/role", s));
        };
        if name.is_empty() {
            return Err(format!("Invalid interface key '{}': empty name", s));
        }
        let version = parse_version_dir(version)
            .ok_or_else(|| format!("Invalid interface key '{}': bad version '{}'", s, version))?;
        Ok(Self::new(*name, version, role.parse()?))
    }
}

impl Serialize for InterfaceKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses a version directory name such as `v2`.
pub fn parse_version_dir(name: &str) -> Option<u32> {
    name.strip_prefix('v')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
}
