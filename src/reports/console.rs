use crate::metrics::{Metric, YearlyReport};
use core::fmt::Write;
use owo_colors::OwoColorize;
use strum::IntoEnumIterator;

const HEADING: &str = "=== GitHub Metrics Report ===";
const YEAR_TITLE: &str = "Year";
const COLUMN_GAP: &str = "  ";

/// Render the report as a fixed-width table, one row per year in ascending order.
#[must_use]
pub fn generate(report: &YearlyReport, use_colors: bool) -> String {
    let metrics: Vec<Metric> = Metric::iter().collect();

    let rows: Vec<Vec<String>> = report
        .iter()
        .map(|(year, counters)| {
            core::iter::once(year.to_string())
                .chain(metrics.iter().map(|metric| counters.get(*metric).to_string()))
                .collect()
        })
        .collect();

    let titles: Vec<&str> = core::iter::once(YEAR_TITLE).chain(metrics.iter().map(|m| m.title())).collect();
    let widths: Vec<usize> = titles
        .iter()
        .enumerate()
        .map(|(column, title)| rows.iter().map(|row| row[column].len()).fold(title.len(), usize::max))
        .collect();

    let mut out = String::new();
    if use_colors {
        let _ = writeln!(out, "{}\n", HEADING.bold());
    } else {
        let _ = writeln!(out, "{HEADING}\n");
    }

    let header = titles
        .iter()
        .zip(&widths)
        .map(|(title, &width)| format!("{title:>width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    if use_colors {
        let _ = writeln!(out, "{}", header.bold());
    } else {
        let _ = writeln!(out, "{header}");
    }

    let rule_len = widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(rule_len));

    for row in &rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        let _ = writeln!(out, "{line}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::year_ranges;

    fn sample() -> YearlyReport {
        let mut report = YearlyReport::new(&year_ranges([2025, 2024]).unwrap());
        for _ in 0..12 {
            report.record(2024, Metric::Commits);
        }
        report.record(2024, Metric::PullRequests);
        report.record(2025, Metric::Issues);
        report
    }

    #[test]
    fn test_plain_table() {
        let table = generate(&sample(), false);
        let expected = "\
=== GitHub Metrics Report ===

Year  Commits  PRs Created  PRs Merged  Issues
----------------------------------------------
2024       12            1           0       0
2025        0            0           0       1
";
        assert_eq!(table, expected);
    }

    #[test]
    fn test_colored_header_is_bold() {
        let table = generate(&sample(), true);
        let mut lines = table.lines();
        assert!(lines.next().unwrap().starts_with("\u{1b}[1m"));
        let header = lines.find(|line| line.contains("PRs Merged")).unwrap();
        assert!(header.starts_with("\u{1b}[1m"));
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let table = generate(&YearlyReport::default(), false);
        assert!(table.starts_with(HEADING));
        assert_eq!(table.lines().count(), 4);
    }
}
