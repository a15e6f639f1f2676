//! Configuration file for validation runs.
//!
//! Every field is optional; anything left out keeps its built-in default.
//!
//! # Example YAML
//!
//! ```yaml
//! helm_bin: /usr/local/bin/helm
//! timeout_secs: 120
//! values_pattern: "*-values.yaml"
//! template:
//!   kubernetes_version: "1.29.0"
//!   namespace: apps
//! kubeconform:
//!   goroutines: 8
//!   ignore_missing_schemas: true
//!   schema_locations:
//!     - default
//!     - "https://raw.githubusercontent.com/datreeio/CRDs-catalog/main/{{.Group}}/{{.ResourceKind}}_{{.ResourceAPIVersion}}.json"
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::options::{KubeconformOptions, TemplateOptions};

/// Executable used to render charts when nothing else is configured.
pub const DEFAULT_HELM_BIN: &str = "helm";

/// Executable used to validate manifests when nothing else is configured.
pub const DEFAULT_KUBECONFORM_BIN: &str = "kubeconform";

/// Name pattern selecting the values files under a chart's `ci` directory.
pub const DEFAULT_VALUES_PATTERN: &str = "*-values.yaml";

/// Top-level configuration for a validation run.
///
/// # Examples
///
/// ```
/// use helm_kubeconform_core::HelmKubeconformConfig;
///
/// let config: HelmKubeconformConfig = serde_yaml::from_str("jobs: 2").unwrap();
/// assert_eq!(config.jobs, Some(2));
/// assert_eq!(config.helm_bin, "helm");
/// assert!(config.kubeconform.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmKubeconformConfig {
    /// Renderer executable.
    pub helm_bin: String,
    /// Validator executable.
    pub kubeconform_bin: String,
    /// Deadline for each external process, in seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,
    /// Ceiling on concurrently processed variants. `None` runs all at once.
    pub jobs: Option<usize>,
    /// Glob matched against file names in the chart's `ci` directory.
    pub values_pattern: String,
    pub template: TemplateOptions,
    /// Validator options. The kubernetes version is not read from the file;
    /// it always follows `template.kubernetes_version`.
    pub kubeconform: KubeconformOptions,
}

impl Default for HelmKubeconformConfig {
    fn default() -> Self {
        Self {
            helm_bin: DEFAULT_HELM_BIN.to_string(),
            kubeconform_bin: DEFAULT_KUBECONFORM_BIN.to_string(),
            timeout_secs: None,
            jobs: None,
            values_pattern: DEFAULT_VALUES_PATTERN.to_string(),
            template: TemplateOptions::default(),
            kubeconform: KubeconformOptions::default(),
        }
    }
}

impl HelmKubeconformConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ConfigError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::ConfigError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Per-process deadline, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
