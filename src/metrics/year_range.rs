use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use core::fmt::{Display, Formatter, Result as FmtResult};

/// One calendar year in UTC, from `YYYY-01-01T00:00:00Z` through `YYYY-12-31T23:59:59Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearRange {
    year: i32,
    start: DateTime<Utc>,
    next_start: DateTime<Utc>,
}

impl YearRange {
    pub fn new(year: i32) -> Result<Self> {
        let out_of_range = || Error::Input(format!("year {year} is out of range"));
        let start = first_instant(year).ok_or_else(out_of_range)?;
        let next_start = year.checked_add(1).and_then(first_instant).ok_or_else(out_of_range)?;

        Ok(Self { year, start, next_start })
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// The last whole second of the year.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.next_start - TimeDelta::seconds(1)
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.next_start
    }
}

impl Display for YearRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.year)
    }
}

fn first_instant(year: i32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

/// Parse a `--year` argument, which must be exactly four ASCII digits.
pub fn parse_year(text: &str) -> Result<i32> {
    let text = text.trim();
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Input(format!("'{text}' is not a four-digit year")));
    }

    let year = text
        .parse()
        .map_err(|e| Error::Input(format!("'{text}' is not a valid year: {e}")))?;

    // Reject years chrono cannot represent up front rather than at range construction.
    let _ = YearRange::new(year)?;
    Ok(year)
}

/// Build sorted, deduplicated ranges for the requested years.
pub fn year_ranges(years: impl IntoIterator<Item = i32>) -> Result<Vec<YearRange>> {
    let mut years: Vec<i32> = years.into_iter().collect();
    years.sort_unstable();
    years.dedup();
    years.into_iter().map(YearRange::new).collect()
}

/// Find the requested year an instant belongs to, if any.
#[must_use]
pub fn year_of(ranges: &[YearRange], instant: DateTime<Utc>) -> Option<i32> {
    ranges.iter().find(|range| range.contains(instant)).map(YearRange::year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_bounds() {
        let range = YearRange::new(2024).unwrap();
        assert_eq!(range.year(), 2024);
        assert_eq!(range.start(), at("2024-01-01T00:00:00Z"));
        assert_eq!(range.end(), at("2024-12-31T23:59:59Z"));
        assert_eq!(range.to_string(), "2024");
    }

    #[test]
    fn test_contains_is_closed_over_the_calendar_year() {
        let range = YearRange::new(2024).unwrap();
        assert!(range.contains(at("2024-01-01T00:00:00Z")));
        assert!(range.contains(at("2024-06-15T12:00:00Z")));
        assert!(range.contains(at("2024-12-31T23:59:59Z")));
        assert!(range.contains(at("2024-12-31T23:59:59.999Z")));
        assert!(!range.contains(at("2023-12-31T23:59:59Z")));
        assert!(!range.contains(at("2025-01-01T00:00:00Z")));
    }

    #[test]
    fn test_contains_respects_offsets() {
        let range = YearRange::new(2025).unwrap();
        // 2024-12-31T23:30:00-01:00 is 2025-01-01T00:30:00Z
        assert!(range.contains(at("2024-12-31T23:30:00-01:00")));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2024").unwrap(), 2024);
        assert_eq!(parse_year(" 1999 ").unwrap(), 1999);
        assert!(parse_year("24").unwrap_err().is_input());
        assert!(parse_year("20245").unwrap_err().is_input());
        assert!(parse_year("20x4").unwrap_err().is_input());
        assert!(parse_year("-202").unwrap_err().is_input());
        assert!(parse_year("").unwrap_err().is_input());
    }

    #[test]
    fn test_year_ranges_sorted_and_deduplicated() {
        let ranges = year_ranges([2025, 2023, 2025, 2024]).unwrap();
        let years: Vec<_> = ranges.iter().map(YearRange::year).collect();
        assert_eq!(years, [2023, 2024, 2025]);
    }

    #[test]
    fn test_year_of() {
        let ranges = year_ranges([2022, 2024]).unwrap();
        assert_eq!(year_of(&ranges, at("2022-03-01T00:00:00Z")), Some(2022));
        assert_eq!(year_of(&ranges, at("2024-03-01T00:00:00Z")), Some(2024));
        assert_eq!(year_of(&ranges, at("2023-03-01T00:00:00Z")), None);
    }
}
