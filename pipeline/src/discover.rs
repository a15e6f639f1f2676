//! Variant discovery.
//!
//! A chart's CI variants are the values files matching
//! `<chart>/ci/*-values.yaml`, the convention used by chart-testing.

use std::path::{Path, PathBuf};

use glob::Pattern;
use helm_kubeconform_core::DEFAULT_VALUES_PATTERN;
use tracing::{debug, info};

use crate::error::DiscoverError;

/// Directory, relative to the chart, holding variant values files.
pub const VALUES_DIR: &str = "ci";

/// File pattern for variant values files inside [`VALUES_DIR`].
pub const VALUES_FILE_PATTERN: &str = DEFAULT_VALUES_PATTERN;

/// One values file driving an independent render and validate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Base name of the values file, e.g. `prod-values.yaml`.
    pub label: String,
    /// Path passed to the renderer.
    pub path: PathBuf,
}

impl Variant {
    pub fn new(path: PathBuf) -> Self {
        Self {
            label: base_name(&path),
            path,
        }
    }
}

/// Lists the variants of `chart` using [`VALUES_FILE_PATTERN`].
pub fn discover_variants(chart: &Path) -> Result<Vec<Variant>, DiscoverError> {
    discover_variants_matching(chart, VALUES_FILE_PATTERN)
}

/// Lists the files in `<chart>/ci` whose name matches `file_pattern`.
///
/// Returns an empty list when the `ci` directory is missing or holds no
/// matching file. The order is the pattern's iteration order and carries no
/// meaning.
///
/// # Errors
///
/// Fails only when the pattern cannot be compiled or a matching entry cannot
/// be read.
pub fn discover_variants_matching(
    chart: &Path,
    file_pattern: &str,
) -> Result<Vec<Variant>, DiscoverError> {
    // Escape the chart part so that brackets or stars in a directory name are
    // matched literally.
    let values_dir = chart.join(VALUES_DIR);
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&values_dir.to_string_lossy()),
        file_pattern
    );
    debug!(%pattern, "Discovering values files");

    let mut variants = Vec::new();
    for entry in glob::glob(&pattern)? {
        variants.push(Variant::new(entry?));
    }

    info!(
        chart = %chart.display(),
        count = variants.len(),
        "Discovered values files"
    );
    Ok(variants)
}

/// Last path component, falling back to the whole path for `.` or `/`.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
