use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2099;

/// Reporting period named in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Period {
    Year { year: i32 },
    Range { start: i32, end: i32 },
    Quarter { year: i32, quarter: u8 },
}

/// Inclusive fiscal-year window passed to the metrics store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub start_year: i32,
    pub end_year: i32,
}

impl Period {
    pub fn year(year: i32) -> Self {
        Period::Year { year }
    }

    /// Builds a range, ordering the bounds. A one-year range collapses to `Year`.
    pub fn range(a: i32, b: i32) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        if start == end {
            Period::Year { year: start }
        } else {
            Period::Range { start, end }
        }
    }

    pub fn quarter(year: i32, quarter: u8) -> Self {
        Period::Quarter { year, quarter }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Period::Range { .. })
    }

    pub fn filters(&self) -> Vec<PeriodFilter> {
        let (start_year, end_year) = match *self {
            Period::Year { year } => (year, year),
            Period::Range { start, end } => (start, end),
            Period::Quarter { year, .. } => (year, year),
        };
        vec![PeriodFilter {
            start_year,
            end_year,
        }]
    }

    /// Whether a record for `year`/`quarter` belongs to this period.
    /// Annual periods match annual records only.
    pub fn contains(&self, year: i32, quarter: Option<u8>) -> bool {
        match *self {
            Period::Year { year: y } => year == y && quarter.is_none(),
            Period::Range { start, end } => (start..=end).contains(&year) && quarter.is_none(),
            Period::Quarter { year: y, quarter: q } => year == y && quarter == Some(q),
        }
    }
}

pub fn is_valid_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|y| is_valid_year(*y))
}

fn parse_quarter(s: &str) -> Option<u8> {
    let digit = s.strip_prefix('q').or_else(|| s.strip_prefix('Q'))?;
    match digit {
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year { year } => write!(f, "{year}"),
            Period::Range { start, end } => write!(f, "{start}-{end}"),
            Period::Quarter { year, quarter } => write!(f, "{year}-Q{quarter}"),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    /// Accepts the canonical forms `2023`, `2020-2022`, `2023-Q2`, plus
    /// `FY2023` and `Q2-2023`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let lowered = raw.to_ascii_lowercase();
        let body = lowered.strip_prefix("fy").unwrap_or(&lowered);

        if let Some(year) = parse_year(body) {
            return Ok(Period::year(year));
        }
        if let Some((left, right)) = body.split_once('-') {
            if let (Some(a), Some(b)) = (parse_year(left), parse_year(right)) {
                return Ok(Period::range(a, b));
            }
            if let (Some(year), Some(q)) = (parse_year(left), parse_quarter(right)) {
                return Ok(Period::quarter(year, q));
            }
            if let (Some(q), Some(year)) = (parse_quarter(left), parse_year(right)) {
                return Ok(Period::quarter(year, q));
            }
        }
        Err(format!("Unknown period: {raw}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Period::year(2023).to_string(), "2023");
        assert_eq!(Period::range(2022, 2020).to_string(), "2020-2022");
        assert_eq!(Period::quarter(2023, 2).to_string(), "2023-Q2");
    }

    #[test]
    fn parses_canonical_and_loose_forms() {
        assert_eq!("2023".parse::<Period>().unwrap(), Period::year(2023));
        assert_eq!("FY2021".parse::<Period>().unwrap(), Period::year(2021));
        assert_eq!("2020-2022".parse::<Period>().unwrap(), Period::range(2020, 2022));
        assert_eq!("2023-Q2".parse::<Period>().unwrap(), Period::quarter(2023, 2));
        assert_eq!("Q4-2019".parse::<Period>().unwrap(), Period::quarter(2019, 4));
        assert!("5".parse::<Period>().is_err());
        assert!("1776".parse::<Period>().is_err());
        assert!("2023-Q5".parse::<Period>().is_err());
    }

    #[test]
    fn single_year_range_collapses() {
        assert_eq!(Period::range(2021, 2021), Period::year(2021));
    }

    #[test]
    fn containment_separates_annual_and_quarterly() {
        let y = Period::year(2023);
        assert!(y.contains(2023, None));
        assert!(!y.contains(2023, Some(1)));

        let q = Period::quarter(2023, 3);
        assert!(q.contains(2023, Some(3)));
        assert!(!q.contains(2023, None));

        let r = Period::range(2020, 2022);
        assert!(r.contains(2021, None));
        assert!(!r.contains(2023, None));
        assert_eq!(
            r.filters(),
            vec![PeriodFilter {
                start_year: 2020,
                end_year: 2022
            }]
        );
    }
}
