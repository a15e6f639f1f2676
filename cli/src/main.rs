use std::path::PathBuf;

use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser};
use helm_kubeconform_core::HelmKubeconformConfig;
use helm_kubeconform_pipeline::discover::base_name;
use helm_kubeconform_pipeline::{
    Pipeline, PipelineError, Report, ReportFormat, SystemRunner, Tools, format_report,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "HELM_KUBECONFORM_LOG";
const HELM_BIN_ENV: &str = "HELM_BIN";
const KUBECONFORM_BIN_ENV: &str = "KUBECONFORM_BIN";

#[derive(Debug, Parser)]
#[command(name = "helm-kubeconform", version)]
#[command(about = "Validate a Helm chart against every ci/*-values.yaml file with kubeconform")]
struct Cli {
    /// Chart directory.
    chart: PathBuf,

    /// YAML configuration file with defaults for every option below.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Report format.
    #[arg(long, default_value = "text")]
    report_format: ReportFormat,
    /// Kill any helm or kubeconform process running longer than this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
    /// Maximum number of values files processed at once (default: all).
    #[arg(long)]
    jobs: Option<usize>,

    /// Specify values in a YAML file or a URL (can specify multiple).
    #[arg(short = 'f', long = "values", help_heading = "Helm template options")]
    values: Vec<String>,
    /// Version of Kubernetes to validate against, e.g. 1.18.0 (default "master").
    #[arg(long, help_heading = "Helm template options")]
    kubernetes_version: Option<String>,
    /// Namespace scope for this request.
    #[arg(short = 'n', long, help_heading = "Helm template options")]
    namespace: Option<String>,

    /// Number of goroutines kubeconform runs concurrently (default 4).
    #[arg(long, help_heading = "Kubeconform options")]
    goroutines: Option<usize>,
    /// Output format - json, junit, tap, text (default "text").
    #[arg(long, help_heading = "Kubeconform options")]
    output: Option<String>,
    /// Comma-separated list of kinds or GVKs to reject.
    #[arg(long, help_heading = "Kubeconform options")]
    reject: Option<String>,
    /// Override schemas location search path (can be specified multiple times, default "default").
    #[arg(long = "schema-location", help_heading = "Kubeconform options")]
    schema_locations: Vec<String>,
    /// Comma-separated list of kinds or GVKs to ignore.
    #[arg(long, help_heading = "Kubeconform options")]
    skip: Option<String>,
    /// Disallow additional properties not in schema or duplicated keys (default true).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", help_heading = "Kubeconform options")]
    strict: Option<bool>,
    /// Print a summary at the end, ignored for junit output (default true).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", help_heading = "Kubeconform options")]
    summary: Option<bool>,
    /// Print results for all resources, ignored for tap and junit output.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", help_heading = "Kubeconform options")]
    verbose: Option<bool>,
    /// Cache schemas downloaded via HTTP to this folder.
    #[arg(long, help_heading = "Kubeconform options")]
    cache: Option<String>,
    /// Stop validation when the first invalid manifest is found.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", help_heading = "Kubeconform options")]
    exit_on_error: Option<bool>,
    /// Skip files with missing schemas instead of failing.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", help_heading = "Kubeconform options")]
    ignore_missing_schemas: Option<bool>,
    /// Disable verification of the server's SSL certificate.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", help_heading = "Kubeconform options")]
    skip_tls_verify: Option<bool>,
}

fn main() {
    init_tracing();
    let cli = parse_cli();

    let result = run(cli);

    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parses arguments with `-v` as the version flag, as helm plugins expect.
fn parse_cli() -> Cli {
    let matches = cli_command().get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn cli_command() -> clap::Command {
    Cli::command().disable_version_flag(true).arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print the version information"),
    )
}

fn run(cli: Cli) -> Result<i32, String> {
    let config = resolve_config(&cli, |key| std::env::var(key).ok())?;

    let tools = Tools {
        helm: config.helm_bin.clone(),
        kubeconform: config.kubeconform_bin.clone(),
    };
    let pipeline = Pipeline::new(SystemRunner::with_timeout(config.timeout()), tools)
        .with_jobs(config.jobs)
        .with_values_pattern(config.values_pattern.clone());

    let outcomes = pipeline
        .run_all(&cli.chart, &config.template, &config.kubeconform)
        .map_err(|err| describe_pipeline_error(&err))?;

    let report = Report::new(base_name(&cli.chart), &outcomes);
    let rendered = format_report(&report, cli.report_format)?;
    print!("{rendered}");

    Ok(report.exit_code())
}

/// Layers defaults, the config file, the environment and the command line.
fn resolve_config(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> Result<HelmKubeconformConfig, String> {
    let mut config = match &cli.config {
        Some(path) => HelmKubeconformConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => HelmKubeconformConfig::default(),
    };

    if let Some(helm) = env(HELM_BIN_ENV).filter(|value| !value.is_empty()) {
        config.helm_bin = helm;
    }
    if let Some(kubeconform) = env(KUBECONFORM_BIN_ENV).filter(|value| !value.is_empty()) {
        config.kubeconform_bin = kubeconform;
    }

    if cli.timeout.is_some() {
        config.timeout_secs = cli.timeout;
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }

    let template = &mut config.template;
    if !cli.values.is_empty() {
        warn!("--values files are replaced by each ci values file during validation");
        template.values_files = cli.values.clone();
    }
    if let Some(version) = &cli.kubernetes_version {
        template.kubernetes_version = version.clone();
    }
    if let Some(namespace) = &cli.namespace {
        template.namespace = namespace.clone();
    }

    let kubeconform = &mut config.kubeconform;
    if let Some(goroutines) = cli.goroutines {
        kubeconform.goroutines = goroutines;
    }
    if let Some(output) = &cli.output {
        kubeconform.output = output.clone();
    }
    if let Some(reject) = &cli.reject {
        kubeconform.reject = reject.clone();
    }
    if !cli.schema_locations.is_empty() {
        kubeconform.schema_locations = cli.schema_locations.clone();
    }
    if let Some(skip) = &cli.skip {
        kubeconform.skip = skip.clone();
    }
    if let Some(strict) = cli.strict {
        kubeconform.strict = strict;
    }
    if let Some(summary) = cli.summary {
        kubeconform.summary = summary;
    }
    if let Some(verbose) = cli.verbose {
        kubeconform.verbose = verbose;
    }
    if let Some(cache) = &cli.cache {
        kubeconform.cache = cache.clone();
    }
    if let Some(exit_on_error) = cli.exit_on_error {
        kubeconform.exit_on_error = exit_on_error;
    }
    if let Some(ignore) = cli.ignore_missing_schemas {
        kubeconform.ignore_missing_schemas = ignore;
    }
    if let Some(skip_tls_verify) = cli.skip_tls_verify {
        kubeconform.skip_tls_verify = skip_tls_verify;
    }

    // One kubernetes version drives both tools.
    config.kubeconform.kubernetes_version = config.template.kubernetes_version.clone();

    Ok(config)
}

fn describe_pipeline_error(err: &PipelineError) -> String {
    match err {
        PipelineError::DependencyUpdate { output, .. } if !output.trim().is_empty() => {
            format!("{err}\n{}", output.trim_end())
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let matches = cli_command()
            .try_get_matches_from(std::iter::once("helm-kubeconform").chain(args.iter().copied()))
            .unwrap();
        Cli::from_arg_matches(&matches).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_command_definition_is_valid() {
        cli_command().debug_assert();
    }

    #[test]
    fn test_defaults_match_built_in_config() {
        let cli = parse(&["./chart"]);
        assert_eq!(cli.chart, PathBuf::from("./chart"));
        assert_eq!(cli.report_format, ReportFormat::Text);

        let config = resolve_config(&cli, no_env).unwrap();
        assert_eq!(config, HelmKubeconformConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "./chart",
            "--kubernetes-version",
            "1.29.0",
            "-n",
            "apps",
            "--goroutines",
            "8",
            "--output",
            "json",
            "--schema-location",
            "default",
            "--schema-location",
            "./crds",
            "--strict=false",
            "--verbose",
            "--ignore-missing-schemas",
            "--timeout",
            "60",
            "--jobs",
            "2",
        ]);
        let config = resolve_config(&cli, no_env).unwrap();

        assert_eq!(config.template.kubernetes_version, "1.29.0");
        assert_eq!(config.template.namespace, "apps");
        assert_eq!(config.kubeconform.kubernetes_version, "1.29.0");
        assert_eq!(config.kubeconform.goroutines, 8);
        assert_eq!(config.kubeconform.output, "json");
        assert_eq!(config.kubeconform.schema_locations, vec!["default", "./crds"]);
        assert!(!config.kubeconform.strict);
        assert!(config.kubeconform.summary);
        assert!(config.kubeconform.verbose);
        assert!(config.kubeconform.ignore_missing_schemas);
        assert!(!config.kubeconform.exit_on_error);
        assert_eq!(config.timeout_secs, Some(60));
        assert_eq!(config.jobs, Some(2));
    }

    #[test]
    fn test_bool_flag_does_not_swallow_chart() {
        let cli = parse(&["--summary", "./chart"]);
        assert_eq!(cli.summary, Some(true));
        assert_eq!(cli.chart, PathBuf::from("./chart"));
    }

    #[test]
    fn test_environment_overrides_binaries() {
        let cli = parse(&["./chart"]);
        let config = resolve_config(&cli, |key| match key {
            HELM_BIN_ENV => Some("/opt/helm3/helm".to_string()),
            KUBECONFORM_BIN_ENV => Some(String::new()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.helm_bin, "/opt/helm3/helm");
        assert_eq!(config.kubeconform_bin, "kubeconform");
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "kubeconform_bin: /usr/bin/kubeconform\njobs: 4\ntemplate:\n  namespace: from-file\nkubeconform:\n  summary: false\n  goroutines: 2\n",
        )
        .unwrap();

        let cli = parse(&[
            "./chart",
            "--config",
            path.to_str().unwrap(),
            "--goroutines",
            "6",
        ]);
        let config = resolve_config(&cli, no_env).unwrap();

        assert_eq!(config.kubeconform_bin, "/usr/bin/kubeconform");
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.template.namespace, "from-file");
        assert!(!config.kubeconform.summary);
        assert_eq!(config.kubeconform.goroutines, 6);
    }

    #[test]
    fn test_switches_can_turn_off_config_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "kubeconform:\n  ignore_missing_schemas: true\n  exit_on_error: true\n  skip_tls_verify: true\n",
        )
        .unwrap();
        let config_arg = path.to_str().unwrap();

        let cli = parse(&["./chart", "--config", config_arg]);
        let config = resolve_config(&cli, no_env).unwrap();
        assert!(config.kubeconform.ignore_missing_schemas);
        assert!(config.kubeconform.exit_on_error);
        assert!(config.kubeconform.skip_tls_verify);

        let cli = parse(&[
            "./chart",
            "--config",
            config_arg,
            "--ignore-missing-schemas=false",
            "--exit-on-error=false",
            "--skip-tls-verify=false",
        ]);
        let config = resolve_config(&cli, no_env).unwrap();
        assert!(!config.kubeconform.ignore_missing_schemas);
        assert!(!config.kubeconform.exit_on_error);
        assert!(!config.kubeconform.skip_tls_verify);
    }

    #[test]
    fn test_bare_switch_enables_option() {
        let cli = parse(&["--exit-on-error", "./chart"]);
        assert_eq!(cli.exit_on_error, Some(true));
        assert_eq!(cli.chart, PathBuf::from("./chart"));
        assert_eq!(cli.skip_tls_verify, None);

        let config = resolve_config(&cli, no_env).unwrap();
        assert!(config.kubeconform.exit_on_error);
        assert!(!config.kubeconform.skip_tls_verify);
    }

    #[test]
    fn test_kubernetes_version_follows_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "template:\n  kubernetes_version: \"1.28.0\"\nkubeconform:\n  kubernetes_version: \"1.20.0\"\n",
        )
        .unwrap();

        let cli = parse(&["./chart", "--config", path.to_str().unwrap()]);
        let config = resolve_config(&cli, no_env).unwrap();
        assert_eq!(config.template.kubernetes_version, "1.28.0");
        assert_eq!(config.kubeconform.kubernetes_version, "1.28.0");
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let cli = parse(&["./chart", "--config", "/nonexistent/helm-kubeconform.yaml"]);
        let err = resolve_config(&cli, no_env).unwrap_err();
        assert!(err.starts_with("Failed to load config"));
    }

    #[test]
    fn test_values_flag_is_repeatable() {
        let cli = parse(&["./chart", "-f", "one.yaml", "--values", "two.yaml"]);
        assert_eq!(cli.values, vec!["one.yaml", "two.yaml"]);
    }
}
