use crate::Result;
use crate::metrics::{Metric, YearlyReport};
use strum::IntoEnumIterator;

const YEAR_COLUMN: &str = "year";

/// Render the report as CSV with a `year,commits,prs,merged,issues` header.
pub fn generate(report: &YearlyReport) -> Result<String> {
    let mut writer = ::csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(core::iter::once(YEAR_COLUMN).chain(Metric::iter().map(Metric::column)))?;
    for (year, counters) in report.iter() {
        writer.write_record(
            core::iter::once(year.to_string()).chain(Metric::iter().map(|metric| counters.get(metric).to_string())),
        )?;
    }

    let bytes = writer.into_inner().map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
