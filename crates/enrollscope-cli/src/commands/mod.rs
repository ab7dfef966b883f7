pub mod catalog;
pub mod enrollment;
pub mod filter;
pub mod heatmap;
pub mod monitor;
pub mod server;
pub mod top;
pub mod treemap;

use std::collections::BTreeSet;

use clap::Args;
use serde::Serialize;

use enrollscope_core::{Attribute, Dataset, GradeBand, YearRange, parse_codes};

/// Academic-year window and program codes shared by the filtering commands.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Academic-year window, inclusive
    #[arg(long, num_args = 2, value_names = ["START", "END"], conflicts_with_all = ["start", "end"])]
    pub years: Option<Vec<i32>>,

    /// First academic year (default: earliest in the data)
    #[arg(long)]
    pub start: Option<i32>,

    /// Last academic year (default: latest in the data)
    #[arg(long)]
    pub end: Option<i32>,

    /// Comma-separated program codes, e.g. S,A (default: every code)
    #[arg(long)]
    pub codes: Option<String>,
}

impl WindowArgs {
    /// The requested window, falling back to the dataset's year span.
    pub fn years(&self, dataset: &Dataset) -> YearRange {
        if let Some(years) = &self.years
            && let [start, end] = years.as_slice()
        {
            return YearRange::new(*start, *end);
        }
        let span = dataset.year_range().unwrap_or(YearRange::new(0, 0));
        YearRange::new(
            self.start.unwrap_or(span.start()),
            self.end.unwrap_or(span.end()),
        )
    }

    /// The requested codes, or every code present in the dataset.
    pub fn codes(&self, dataset: &Dataset) -> BTreeSet<String> {
        match &self.codes {
            Some(codes) => parse_codes(codes),
            None => dataset.codes(),
        }
    }
}

/// Load the enrollment CSV or exit with the error.
pub fn load_dataset(path: &str) -> Dataset {
    match Dataset::load(path) {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse a grade band, warning on unrecognized values.
pub fn parse_grades(s: &str) -> GradeBand {
    let band = GradeBand::parse(s);
    if band == GradeBand::All && s.trim() != "all" {
        eprintln!("Unknown grade band '{s}', using all grades");
    }
    band
}

/// Parse an attribute key or exit listing the valid keys.
pub fn parse_attribute(key: &str) -> Attribute {
    match Attribute::parse(key) {
        Some(attribute) => attribute,
        None => {
            let keys: Vec<&str> = Attribute::ALL.iter().map(|a| a.key()).collect();
            eprintln!("Unknown attribute '{key}'. Use one of: {}", keys.join(", "));
            std::process::exit(2);
        }
    }
}

/// Serialize `value` as pretty JSON to `path`, reporting the outcome.
pub fn write_json<T: Serialize>(value: &T, path: &str, what: &str) {
    let contents = match serde_json::to_string_pretty(value) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Failed to serialize {what}: {e}");
            return;
        }
    };
    match std::fs::write(path, contents) {
        Ok(()) => println!("\n{what} written to {path}"),
        Err(e) => eprintln!("\nFailed to write {path}: {e}"),
    }
}

/// Shorten `s` to at most `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrollscope_core::EnrollmentRecord;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            EnrollmentRecord::new("1", "Crew", "S", 2016, 9),
            EnrollmentRecord::new("2", "Chorus", "A", 2019, 10),
            EnrollmentRecord::new("3", "Robotics", "O", 2021, 8),
        ])
    }

    // -----------------------------------------------------------------------
    // WindowArgs tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_years_default_to_dataset_span() {
        let window = WindowArgs::default();
        assert_eq!(window.years(&dataset()), YearRange::new(2016, 2021));
    }

    #[test]
    fn test_years_pair_overrides_bounds() {
        let window = WindowArgs {
            years: Some(vec![2020, 2017]),
            ..Default::default()
        };
        assert_eq!(window.years(&dataset()), YearRange::new(2017, 2020));
    }

    #[test]
    fn test_single_bound_keeps_other_default() {
        let window = WindowArgs {
            start: Some(2018),
            ..Default::default()
        };
        assert_eq!(window.years(&dataset()), YearRange::new(2018, 2021));
    }

    #[test]
    fn test_codes_default_to_all() {
        let ds = dataset();
        assert_eq!(WindowArgs::default().codes(&ds).len(), 3);
        let window = WindowArgs {
            codes: Some("S, A".into()),
            ..Default::default()
        };
        let codes: Vec<String> = window.codes(&ds).into_iter().collect();
        assert_eq!(codes, vec!["A", "S"]);
    }

    // -----------------------------------------------------------------------
    // Parsing helpers
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_grades() {
        assert_eq!(parse_grades("hs"), GradeBand::Hs);
        assert_eq!(parse_grades("ms"), GradeBand::Ms);
        assert_eq!(parse_grades("all"), GradeBand::All);
        assert_eq!(parse_grades("everyone"), GradeBand::All);
    }

    #[test]
    fn test_parse_attribute_known_keys() {
        assert_eq!(parse_attribute("gender"), Attribute::Gender);
        assert_eq!(parse_attribute("fa"), Attribute::FinancialAid);
        assert_eq!(parse_attribute("program"), Attribute::ProgramName);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Crew", 10), "Crew");
        assert_eq!(truncate("Girls Varsity Crew", 8), "Girls V…");
        assert_eq!(truncate("Girls Varsity Crew", 8).chars().count(), 8);
    }

    #[test]
    fn test_write_json_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("enrollscope-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.json");
        write_json(&dataset().catalog(), path.to_str().unwrap(), "Catalog");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["students"], 3);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
