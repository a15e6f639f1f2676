//! Error types for process execution and pipeline runs.
//!
//! Only [`PipelineError`] is ever returned from
//! [`Pipeline::run_all`](crate::Pipeline::run_all); render and validation
//! failures are carried inside each [`Outcome`](crate::Outcome) as a
//! [`StageError`].

use std::time::Duration;

use thiserror::Error;

/// Failure of a single external process invocation.
#[derive(Debug, Error)]
pub enum RunError {
    /// The process could not be started (for example, executable not found).
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully. `code` is `None` when it
    /// was terminated by a signal.
    #[error("'{program}' exited with {}", exit_label(.code))]
    Exit { program: String, code: Option<i32> },

    /// The configured deadline elapsed and the process was killed.
    #[error("'{program}' timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    /// Waiting on the running process failed.
    #[error("failed to wait on '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Returns `true` when the process never started.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }

    /// Exit code reported by the process, when it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "a signal".to_string(),
    }
}

/// Pipeline stage that failed for one variant.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("render failed: {0}")]
    Render(#[source] RunError),

    #[error("validation failed: {0}")]
    Validate(#[source] RunError),
}

impl StageError {
    /// Short stage name used in reports.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Validate(_) => "validate",
        }
    }

    /// The underlying process failure.
    pub fn run_error(&self) -> &RunError {
        match self {
            Self::Render(err) | Self::Validate(err) => err,
        }
    }
}

/// Typed error for variant discovery.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// The values-file pattern could not be compiled.
    #[error("invalid values file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A matching path could not be read.
    #[error("cannot read values file: {0}")]
    Access(#[from] glob::GlobError),
}

/// Failure that aborts a whole run before any variant is processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `helm dependency update` failed for the chart.
    #[error("dependency update failed for chart '{chart}': {source}")]
    DependencyUpdate {
        chart: String,
        /// Captured output of the failed command.
        output: String,
        #[source]
        source: RunError,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoverError),

    /// The worker pool for variant tasks could not be built.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_display() {
        let err = RunError::Exit {
            program: "kubeconform".to_string(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "'kubeconform' exited with exit status 1");
        assert_eq!(err.exit_code(), Some(1));
        assert!(!err.is_launch_failure());

        let signalled = RunError::Exit {
            program: "helm".to_string(),
            code: None,
        };
        assert_eq!(signalled.to_string(), "'helm' exited with a signal");
    }

    #[test]
    fn test_spawn_error_is_launch_failure() {
        let err = RunError::Spawn {
            program: "helm".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_launch_failure());
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_stage_error_labels() {
        let render = StageError::Render(RunError::Exit {
            program: "helm".to_string(),
            code: Some(1),
        });
        assert_eq!(render.stage(), "render");
        assert_eq!(
            render.to_string(),
            "render failed: 'helm' exited with exit status 1"
        );

        let validate = StageError::Validate(RunError::TimedOut {
            program: "kubeconform".to_string(),
            timeout: Duration::from_secs(2),
        });
        assert_eq!(validate.stage(), "validate");
        assert!(validate.run_error().to_string().contains("timed out after 2s"));
    }
}
