//! Concurrent validation of rendered Helm charts.
//!
//! For a chart directory this crate resolves chart dependencies, discovers
//! every `ci/*-values.yaml` variant, renders each variant with `helm template`
//! and pipes the result into `kubeconform`, one concurrent task per variant.
//! Each variant yields an [`Outcome`]; a failing variant never aborts its
//! siblings.
//!
//! # Main entry points
//!
//! - [`Pipeline::run_all`] — run the whole pipeline for one chart.
//! - [`discover::discover_variants`] — list a chart's variants.
//! - [`Report`] and [`output::format_report`] — aggregate and print outcomes.
//!
//! External processes are launched through the [`ProcessRunner`] trait;
//! [`SystemRunner`] is the real implementation.

pub mod discover;
pub mod error;
pub mod helm;
pub mod kubeconform;
pub mod orchestrator;
pub mod output;
pub mod report;
pub mod runner;

pub use discover::{Variant, discover_variants, discover_variants_matching};
pub use error::{DiscoverError, PipelineError, RunError, StageError};
pub use orchestrator::{Outcome, OutcomeStatus, Pipeline};
pub use output::{ReportFormat, format_report};
pub use report::{FailedStage, OutcomeRecord, Report};
pub use runner::{Execution, ProcessRunner, SystemRunner, Tools};
