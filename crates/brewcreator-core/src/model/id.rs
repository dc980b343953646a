use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable opaque identifier for a piece of equipment.
///
/// The service hands these out as strings; nothing may be assumed about
/// their shape beyond equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(String);

impl EquipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EquipmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EquipmentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl FromStr for EquipmentId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
