//! Helm invocations: dependency resolution and chart rendering.

use std::path::Path;

use helm_kubeconform_core::TemplateOptions;
use tracing::debug;

use crate::discover::Variant;
use crate::runner::{Execution, ProcessRunner};

/// Runs `helm dependency update <chart>`.
pub fn dependency_update<R: ProcessRunner + ?Sized>(
    runner: &R,
    helm: &str,
    chart: &Path,
) -> Execution {
    let args = vec![
        "dependency".to_string(),
        "update".to_string(),
        chart.to_string_lossy().into_owned(),
    ];
    runner.run(helm, &args, None)
}

/// Builds the `helm template` argument list for one variant.
///
/// The variant's values file replaces any values files already present in
/// `options`.
pub fn template_args(chart: &Path, variant: &Variant, options: &TemplateOptions) -> Vec<String> {
    let mut args = vec![
        "template".to_string(),
        chart.to_string_lossy().into_owned(),
    ];
    args.extend(options.for_values_file(&variant.path).to_args());
    args
}

/// Renders `chart` with `variant`'s values file.
///
/// On failure the execution carries helm's diagnostics as its output.
pub fn render<R: ProcessRunner + ?Sized>(
    runner: &R,
    helm: &str,
    chart: &Path,
    variant: &Variant,
    options: &TemplateOptions,
) -> Execution {
    debug!(values = %variant.label, "Rendering chart");
    runner.run(helm, &template_args(chart, variant, options), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_template_args_override_values_files() {
        let options = TemplateOptions {
            values_files: vec!["from-user.yaml".to_string()],
            kubernetes_version: "1.30.0".to_string(),
            namespace: "web".to_string(),
        };
        let variant = Variant::new(PathBuf::from("./chart/ci/a-values.yaml"));

        assert_eq!(
            template_args(Path::new("./chart"), &variant, &options),
            vec![
                "template",
                "./chart",
                "--kube-version",
                "1.30.0",
                "--values",
                "./chart/ci/a-values.yaml",
                "--namespace",
                "web",
            ]
        );
    }

    #[test]
    fn test_template_args_with_defaults() {
        let variant = Variant::new(PathBuf::from("chart/ci/b-values.yaml"));
        assert_eq!(
            template_args(Path::new("chart"), &variant, &TemplateOptions::default()),
            vec!["template", "chart", "--values", "chart/ci/b-values.yaml"]
        );
    }
}
