//! Concurrent render and validate runs over every variant of a chart.
//!
//! Each variant goes through
//! `Pending -> Rendering -> {RenderFailed | Rendered -> Validating -> {Valid | Invalid}}`
//! on its own task. Tasks share nothing but the completion channel, which has
//! room for one [`Outcome`] per variant and is closed by a coordinator once
//! the last task has finished.

use std::path::Path;
use std::sync::mpsc;

use helm_kubeconform_core::{KubeconformOptions, TemplateOptions};
use tracing::{debug, info};

use crate::discover::{VALUES_FILE_PATTERN, Variant, base_name, discover_variants_matching};
use crate::error::{PipelineError, StageError};
use crate::runner::{ProcessRunner, SystemRunner, Tools};
use crate::{helm, kubeconform};

/// Terminal state of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    RenderFailed,
    Valid,
    Invalid,
}

/// Result of rendering and validating one variant.
#[derive(Debug)]
pub struct Outcome {
    /// Chart base name.
    pub chart: String,
    /// Values file base name.
    pub values: String,
    /// Renderer output if rendering failed, validator output otherwise.
    pub output: String,
    /// Set exactly when either stage failed.
    pub error: Option<StageError>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> OutcomeStatus {
        match self.error {
            None => OutcomeStatus::Valid,
            Some(StageError::Render(_)) => OutcomeStatus::RenderFailed,
            Some(StageError::Validate(_)) => OutcomeStatus::Invalid,
        }
    }
}

/// Runs the render and validate stages for every variant of a chart.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use helm_kubeconform_core::{KubeconformOptions, TemplateOptions};
/// use helm_kubeconform_pipeline::{Pipeline, SystemRunner, Tools};
///
/// let pipeline = Pipeline::new(SystemRunner::new(), Tools::default());
/// let outcomes = pipeline
///     .run_all(
///         Path::new("./chart"),
///         &TemplateOptions::default(),
///         &KubeconformOptions::default(),
///     )
///     .unwrap();
/// for outcome in &outcomes {
///     println!("{}: {}", outcome.values, outcome.is_success());
/// }
/// ```
#[derive(Debug)]
pub struct Pipeline<R = SystemRunner> {
    runner: R,
    tools: Tools,
    jobs: Option<usize>,
    values_pattern: String,
}

impl<R: ProcessRunner> Pipeline<R> {
    pub fn new(runner: R, tools: Tools) -> Self {
        Self {
            runner,
            tools,
            jobs: None,
            values_pattern: VALUES_FILE_PATTERN.to_string(),
        }
    }

    /// Caps how many variants run at once. `None` (the default) runs every
    /// variant concurrently.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.filter(|jobs| *jobs > 0);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Replaces the file name pattern used to find values files in `ci/`.
    pub fn with_values_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.values_pattern = pattern.into();
        self
    }

    /// Resolves chart dependencies, discovers variants and validates each one.
    ///
    /// Returns exactly one [`Outcome`] per discovered variant, in no
    /// particular order. Render and validation failures are reported inside
    /// the outcomes.
    ///
    /// # Errors
    ///
    /// Fails, without processing any variant, when dependency resolution or
    /// discovery fails (including a malformed values pattern).
    pub fn run_all(
        &self,
        chart: &Path,
        template: &TemplateOptions,
        validator: &KubeconformOptions,
    ) -> Result<Vec<Outcome>, PipelineError> {
        let chart_label = base_name(chart);

        if let Err((output, source)) =
            helm::dependency_update(&self.runner, &self.tools.helm, chart).into_result()
        {
            return Err(PipelineError::DependencyUpdate {
                chart: chart.display().to_string(),
                output,
                source,
            });
        }

        let variants = discover_variants_matching(chart, &self.values_pattern)?;
        if variants.is_empty() {
            info!(chart = %chart_label, "No values files to validate");
            return Ok(Vec::new());
        }

        let workers = self.jobs.unwrap_or(variants.len()).min(variants.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("variant-{index}"))
            .build()?;
        debug!(variants = variants.len(), workers, "Starting variant tasks");

        let (sender, receiver) = mpsc::sync_channel(variants.len());
        let outcomes: Vec<Outcome> = std::thread::scope(|scope| {
            let variants = &variants;
            let pool = &pool;
            let chart_label = chart_label.as_str();

            // Coordinator: waits for every task, then closes the channel by
            // dropping the last sender.
            scope.spawn(move || {
                pool.scope(|tasks| {
                    for variant in variants {
                        let sender = sender.clone();
                        tasks.spawn(move |_| {
                            let outcome =
                                self.run_variant(chart, chart_label, variant, template, validator);
                            let _ = sender.send(outcome);
                        });
                    }
                });
                drop(sender);
            });

            receiver.iter().collect()
        });

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            chart = %chart_label,
            total = outcomes.len(),
            failed,
            "Validation finished"
        );
        Ok(outcomes)
    }

    fn run_variant(
        &self,
        chart: &Path,
        chart_label: &str,
        variant: &Variant,
        template: &TemplateOptions,
        validator: &KubeconformOptions,
    ) -> Outcome {
        let outcome = |output: String, error: Option<StageError>| Outcome {
            chart: chart_label.to_string(),
            values: variant.label.clone(),
            output,
            error,
        };

        let manifests =
            match helm::render(&self.runner, &self.tools.helm, chart, variant, template)
                .into_result()
            {
                Ok(manifests) => manifests,
                Err((output, err)) => {
                    debug!(values = %variant.label, error = %err, "Render failed");
                    return outcome(output, Some(StageError::Render(err)));
                }
            };

        debug!(values = %variant.label, bytes = manifests.len(), "Validating rendered manifests");
        let validation =
            kubeconform::validate(&self.runner, &self.tools.kubeconform, &manifests, validator);
        debug!(values = %variant.label, success = validation.is_success(), "Validation done");
        outcome(validation.output, validation.error.map(StageError::Validate))
    }
}
