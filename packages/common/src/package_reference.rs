use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validators::{validate_package_name, validate_version_number};

/// A fully qualified reference to a package version:
/// `<namespace>-<name>-<major.minor.patch>`.
///
/// Names are `[A-Za-z0-9_]` and cannot contain `-`, so splitting on the
/// last two separators is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageReference {
    pub namespace: String,
    pub name: String,
    pub version: (u64, u64, u64),
}

impl PackageReference {
    pub fn new(namespace: &str, name: &str, version: &str) -> Result<Self, String> {
        validate_package_name(namespace).map_err(|e| format!("namespace: {e}"))?;
        validate_package_name(name).map_err(|e| format!("name: {e}"))?;
        let version = validate_version_number(version)?;
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            version,
        })
    }

    /// Parse `<namespace>-<name>-<x.y.z>`.
    pub fn parse(reference: &str) -> Result<Self, String> {
        let mut parts = reference.rsplitn(3, '-');
        let version = parts
            .next()
            .ok_or_else(|| format!("Invalid package reference: {reference}"))?;
        let name = parts
            .next()
            .ok_or_else(|| format!("Invalid package reference: {reference}"))?;
        let namespace = parts
            .next()
            .ok_or_else(|| format!("Invalid package reference: {reference}"))?;
        Self::new(namespace, name, version)
    }

    pub fn version_string(&self) -> String {
        let (major, minor, patch) = self.version;
        format!("{major}.{minor}.{patch}")
    }

    /// `<namespace>-<name>` without the version.
    pub fn package_name(&self) -> String {
        format!("{}-{}", self.namespace, self.name)
    }

    /// Whether two references point at the same package, ignoring version.
    pub fn same_package(&self, other: &PackageReference) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.namespace, self.name, self.version_string())
    }
}

impl Serialize for PackageReference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PackageReference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        let r = PackageReference::parse("TeamA-Mod-1.0.0").unwrap();
        assert_eq!(r.namespace, "TeamA");
        assert_eq!(r.name, "Mod");
        assert_eq!(r.version, (1, 0, 0));
        assert_eq!(r.to_string(), "TeamA-Mod-1.0.0");
    }

    #[test]
    fn underscores_survive() {
        let r = PackageReference::parse("Some_Team-Test_Package-2.13.0").unwrap();
        assert_eq!(r.namespace, "Some_Team");
        assert_eq!(r.name, "Test_Package");
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in [
            "TeamOnly",
            "Team-Name",
            "Team-Name-1.0",
            "Team-Name-01.0.0",
            "Team-Na me-1.0.0",
            "",
        ] {
            assert!(PackageReference::parse(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn same_package_ignores_version() {
        let a = PackageReference::parse("T-M-1.0.0").unwrap();
        let b = PackageReference::parse("T-M-2.0.0").unwrap();
        let c = PackageReference::parse("T-Other-1.0.0").unwrap();
        assert!(a.same_package(&b));
        assert!(!a.same_package(&c));
    }

    #[test]
    fn serde_uses_string_form() {
        let r = PackageReference::parse("T-M-1.2.3").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"T-M-1.2.3\"");
        let parsed: PackageReference = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }
}
