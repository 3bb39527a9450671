//! Component kind and instance identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VitrineError;

/// Identifies a registered component kind (dotted notation).
/// Example: `sim.diffusion2d`, `viewer.structure3d`
///
/// Pool lookups match on the exact kind, never on any subtype or
/// capability relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentKind(String);

impl ComponentKind {
    /// Creates a new `ComponentKind`, validating the format.
    pub fn new(kind: impl Into<String>) -> Result<Self, VitrineError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(VitrineError::invalid_input("component kind cannot be empty"));
        }
        // Must contain at least one dot (namespaced, e.g. sim.diffusion2d)
        if !kind.contains('.') {
            return Err(VitrineError::invalid_input(
                "component kind must use dotted notation (e.g. sim.diffusion2d)",
            ));
        }
        if kind.chars().any(char::is_whitespace) {
            return Err(VitrineError::invalid_input(
                "component kind cannot contain whitespace",
            ));
        }
        Ok(Self(kind))
    }

    /// Returns the kind as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ComponentKind {
    type Err = VitrineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Pool-assigned identity of a tracked instance.
///
/// Ids are sequential within one pool and are never reused; an instance
/// keeps its id for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Creates an instance id from its raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn valid_kind_accepted() {
        let kind = ComponentKind::new("sim.diffusion2d").unwrap();
        assert_eq!(kind.as_str(), "sim.diffusion2d");
    }

    #[test]
    fn empty_kind_rejected() {
        let err = ComponentKind::new("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn kind_without_dot_rejected() {
        assert!(ComponentKind::new("diffusion").is_err());
    }

    #[test]
    fn kind_with_whitespace_rejected() {
        assert!(ComponentKind::new("sim. diffusion").is_err());
        assert!(ComponentKind::new("sim.diffusion\t2d").is_err());
    }

    #[test]
    fn kind_from_str() {
        let kind: ComponentKind = "viewer.structure3d".parse().unwrap();
        assert_eq!(kind.to_string(), "viewer.structure3d");
    }

    #[test]
    fn kind_serde_roundtrip() {
        let kind = ComponentKind::new("sim.wave1d").unwrap();
        let json = serde_json::to_string(&kind).expect("serialize");
        let back: ComponentKind = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, kind);
    }

    #[test]
    fn instance_id_display() {
        assert_eq!(InstanceId::new(7).to_string(), "#7");
    }

    #[test]
    fn instance_id_value() {
        assert_eq!(InstanceId::new(42).value(), 42);
    }
}
