use crate::Result;
use crate::metrics::YearlyReport;

/// Render the report as a JSON object keyed by year.
///
/// ```json
/// { "2024": { "commits": 3, "prs": 2, "merged": 1, "issues": 0 } }
/// ```
pub fn generate(report: &YearlyReport) -> Result<String> {
    let mut text = serde_json::to_string_pretty(report)?;
    text.push('\n');
    Ok(text)
}
