//! Core option records and configuration for chart validation runs.
//!
//! This crate models what gets forwarded to the two external tools without
//! running either of them:
//!
//! - [`TemplateOptions`] — options for `helm template`, flattened with
//!   [`TemplateOptions::to_args`].
//! - [`KubeconformOptions`] — options for `kubeconform`, flattened with
//!   [`KubeconformOptions::to_args`].
//! - [`HelmKubeconformConfig`] — the YAML configuration file bundling both
//!   option sets with executable names and run limits.
//!
//! # Example
//!
//! ```
//! use helm_kubeconform_core::*;
//!
//! let template = TemplateOptions::default();
//! let variant = template.for_values_file(std::path::Path::new("chart/ci/prod-values.yaml"));
//! assert_eq!(variant.to_args(), vec!["--values", "chart/ci/prod-values.yaml"]);
//!
//! let kubeconform = KubeconformOptions { verbose: true, ..KubeconformOptions::default() };
//! assert!(kubeconform.to_args().contains(&"-verbose".to_string()));
//! ```

mod config;
mod error;
mod options;

pub use config::{
    DEFAULT_HELM_BIN, DEFAULT_KUBECONFORM_BIN, DEFAULT_VALUES_PATTERN, HelmKubeconformConfig,
};
pub use error::{ConfigError, Result};
pub use options::*;
