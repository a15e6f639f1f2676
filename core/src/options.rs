//! Option records for the two external tools and their flattening into
//! argument lists.
//!
//! Every field has a documented default. Flattening emits an argument only
//! when the field differs from that default, with three exceptions that are
//! part of the tools' contract: `schema_locations` is always emitted (its
//! default is the `"default"` sentinel), and `strict` / `summary` are emitted
//! whenever they are `true`, which is also their default.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Sentinel kubernetes version meaning "latest", never forwarded to a tool.
pub const DEFAULT_KUBERNETES_VERSION: &str = "master";

/// Default kubeconform worker count (`-n`).
pub const DEFAULT_GOROUTINES: usize = 4;

/// Default kubeconform output format.
pub const DEFAULT_OUTPUT_FORMAT: &str = "text";

/// Default schema location sentinel understood by kubeconform.
pub const DEFAULT_SCHEMA_LOCATION: &str = "default";

/// Options forwarded to `helm template`.
///
/// # Examples
///
/// ```
/// use helm_kubeconform_core::TemplateOptions;
///
/// let options = TemplateOptions {
///     kubernetes_version: "1.29.0".to_string(),
///     namespace: "apps".to_string(),
///     ..TemplateOptions::default()
/// };
/// assert_eq!(
///     options.to_args(),
///     vec!["--kube-version", "1.29.0", "--namespace", "apps"]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Values files passed with `--values`, in order.
    pub values_files: Vec<String>,
    /// Target kubernetes version (`"master"` means unset).
    pub kubernetes_version: String,
    /// Namespace scope (empty means unset).
    pub namespace: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            values_files: Vec::new(),
            kubernetes_version: DEFAULT_KUBERNETES_VERSION.to_string(),
            namespace: String::new(),
        }
    }
}

impl TemplateOptions {
    /// Flattens the options into `helm template` arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.kubernetes_version != DEFAULT_KUBERNETES_VERSION {
            args.push("--kube-version".to_string());
            args.push(self.kubernetes_version.clone());
        }
        for values_file in &self.values_files {
            args.push("--values".to_string());
            args.push(values_file.clone());
        }
        if !self.namespace.is_empty() {
            args.push("--namespace".to_string());
            args.push(self.namespace.clone());
        }
        args
    }

    /// Returns a fresh copy whose values-file list is exactly `values_file`.
    ///
    /// Any values files already present are replaced, not appended to.
    pub fn for_values_file(&self, values_file: &Path) -> Self {
        Self {
            values_files: vec![values_file.to_string_lossy().into_owned()],
            ..self.clone()
        }
    }
}

/// Options forwarded to `kubeconform`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeconformOptions {
    /// Schema cache directory (`-cache`).
    pub cache: String,
    pub exit_on_error: bool,
    pub ignore_missing_schemas: bool,
    pub skip_tls_verify: bool,
    /// Copied from [`TemplateOptions::kubernetes_version`] by the caller so
    /// both tools target the same release. Never read from or written to
    /// configuration files.
    #[serde(skip)]
    pub kubernetes_version: String,
    /// Worker count used by kubeconform itself (`-n`).
    pub goroutines: usize,
    /// `json`, `junit`, `tap` or `text`.
    pub output: String,
    /// Comma-separated kinds or GVKs to reject.
    pub reject: String,
    pub schema_locations: Vec<String>,
    /// Comma-separated kinds or GVKs to ignore.
    pub skip: String,
    pub strict: bool,
    pub summary: bool,
    pub verbose: bool,
}

impl Default for KubeconformOptions {
    fn default() -> Self {
        Self {
            cache: String::new(),
            exit_on_error: false,
            ignore_missing_schemas: false,
            skip_tls_verify: false,
            kubernetes_version: DEFAULT_KUBERNETES_VERSION.to_string(),
            goroutines: DEFAULT_GOROUTINES,
            output: DEFAULT_OUTPUT_FORMAT.to_string(),
            reject: String::new(),
            schema_locations: vec![DEFAULT_SCHEMA_LOCATION.to_string()],
            skip: String::new(),
            strict: true,
            summary: true,
            verbose: false,
        }
    }
}

impl KubeconformOptions {
    /// Flattens the options into `kubeconform` arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use helm_kubeconform_core::KubeconformOptions;
    ///
    /// let args = KubeconformOptions::default().to_args();
    /// assert_eq!(args, vec!["-schema-location", "default", "-strict", "-summary"]);
    /// ```
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.cache.is_empty() {
            args.push("-cache".to_string());
            args.push(self.cache.clone());
        }
        if self.exit_on_error {
            args.push("-exit-on-error".to_string());
        }
        if self.ignore_missing_schemas {
            args.push("-ignore-missing-schemas".to_string());
        }
        if self.skip_tls_verify {
            args.push("-skip-tls-verify".to_string());
        }
        if self.kubernetes_version != DEFAULT_KUBERNETES_VERSION {
            args.push("-kubernetes-version".to_string());
            args.push(self.kubernetes_version.clone());
        }
        if self.goroutines != DEFAULT_GOROUTINES {
            args.push("-n".to_string());
            args.push(self.goroutines.to_string());
        }
        if self.output != DEFAULT_OUTPUT_FORMAT {
            args.push("-output".to_string());
            args.push(self.output.clone());
        }
        if !self.reject.is_empty() {
            args.push("-reject".to_string());
            args.push(self.reject.clone());
        }
        for location in &self.schema_locations {
            args.push("-schema-location".to_string());
            args.push(location.clone());
        }
        if !self.skip.is_empty() {
            args.push("-skip".to_string());
            args.push(self.skip.clone());
        }
        if self.strict {
            args.push("-strict".to_string());
        }
        if self.summary {
            args.push("-summary".to_string());
        }
        if self.verbose {
            args.push("-verbose".to_string());
        }
        args
    }
}
