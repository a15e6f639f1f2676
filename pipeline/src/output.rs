//! Output formatting for validation reports.

use crate::report::Report;

/// Supported report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ReportFormat {
    /// One block per values file with the captured tool output.
    #[default]
    Text,
    Json,
    Yaml,
}

/// Formats a report in the requested format.
pub fn format_report(report: &Report, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(report_to_text(report)),
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        ReportFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

fn report_to_text(report: &Report) -> String {
    let mut out = String::new();
    for record in &report.outcomes {
        out.push_str(&format!(
            "validate chart \"{}\" with values \"{}\":\n{}\n",
            record.chart, record.values, record.output
        ));
    }
    out
}
