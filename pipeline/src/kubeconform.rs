//! Kubeconform invocation.

use helm_kubeconform_core::KubeconformOptions;

use crate::runner::{Execution, ProcessRunner};

/// Validates rendered manifests by piping them into kubeconform.
///
/// Leading and trailing newlines are trimmed from the captured output.
pub fn validate<R: ProcessRunner + ?Sized>(
    runner: &R,
    kubeconform: &str,
    manifests: &str,
    options: &KubeconformOptions,
) -> Execution {
    let execution = runner.run(kubeconform, &options.to_args(), Some(manifests));
    Execution {
        output: trim_newlines(&execution.output).to_string(),
        error: execution.error,
    }
}

fn trim_newlines(text: &str) -> &str {
    text.trim_matches('\n')
}
