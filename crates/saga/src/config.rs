use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// What the rollback does after a compensation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompensationPolicy {
    /// Stop at the first failed compensation; earlier steps stay as they are.
    #[default]
    FailFast,
    /// Keep compensating the remaining steps and report every failure.
    BestEffort,
}

/// Saga settings.
///
/// Read from a standalone TOML document or from the `saga` metadata table of a
/// Cargo manifest:
///
/// ```toml
/// [package.metadata.saga]
/// compensation = "best-effort"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SagaConfig {
    compensation: CompensationPolicy,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<ManifestSection>,
    workspace: Option<ManifestSection>,
}

#[derive(Debug, Deserialize)]
struct ManifestSection {
    metadata: Option<ManifestMetadata>,
}

#[derive(Debug, Deserialize)]
struct ManifestMetadata {
    saga: Option<SagaConfig>,
}

impl SagaConfig {
    #[must_use]
    pub fn compensation(&self) -> CompensationPolicy {
        self.compensation
    }

    #[must_use]
    pub fn with_compensation(mut self, compensation: CompensationPolicy) -> Self {
        self.compensation = compensation;
        self
    }

    /// Parse a standalone TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `[package.metadata.saga]`, falling back to
    /// `[workspace.metadata.saga]`, then to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the manifest cannot be read and
    /// [`ConfigError::ParseFile`] if it cannot be parsed.
    pub fn from_manifest(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
                path: path.to_path_buf(),
                source,
            })?;

        let from_section = |section: Option<ManifestSection>| {
            section
                .and_then(|section| section.metadata)
                .and_then(|metadata| metadata.saga)
        };

        Ok(from_section(manifest.package)
            .or_else(|| from_section(manifest.workspace))
            .unwrap_or_default())
    }
}
