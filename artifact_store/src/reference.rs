//! Artifact references of the form `name`, `name:latest`, or `name:vN`.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Which version of a named artifact a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    /// Newest published version.
    Latest,
    /// Explicit version number (`vN`).
    Version(u32),
}

/// Parsed artifact reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub selector: VersionSelector,
}

impl ArtifactRef {
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: VersionSelector::Latest,
        }
    }

    pub fn version(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            selector: VersionSelector::Version(version),
        }
    }

    /// Parse `name`, `name:latest`, or `name:vN`.
    pub fn parse(reference: &str) -> Result<Self, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (name, selector) = match reference.split_once(':') {
            None => (reference, VersionSelector::Latest),
            Some((name, "latest")) => (name, VersionSelector::Latest),
            Some((name, tag)) => {
                let digits = tag
                    .strip_prefix('v')
                    .ok_or_else(|| invalid("version must be 'latest' or 'v<N>'"))?;
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid("version must be 'latest' or 'v<N>'"));
                }
                let version = digits
                    .parse::<u32>()
                    .map_err(|_| invalid("version number out of range"))?;
                (name, VersionSelector::Version(version))
            }
        };

        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            selector,
        })
    }
}

impl FromStr for ArtifactRef {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.selector {
            VersionSelector::Latest => write!(f, "{}:latest", self.name),
            VersionSelector::Version(version) => write!(f, "{}:v{}", self.name, version),
        }
    }
}

/// Validate that a name is safe for use as a directory under `artifacts/`.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'))
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Artifact types are free-form but must hold a non-blank character.
pub fn validate_type(artifact_type: &str) -> Result<(), StoreError> {
    if artifact_type.trim().is_empty() {
        return Err(StoreError::InvalidType(artifact_type.to_string()));
    }
    Ok(())
}
