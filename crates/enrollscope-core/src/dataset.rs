//! The read-only enrollment dataset and the catalog constants derived from it.
//!
//! A [`Dataset`] is loaded once at process start and shared by reference (or
//! behind an `Arc`) for every query afterwards. It is never mutated after
//! construction; each enrollment's full program name is derived exactly once,
//! when the dataset is built.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::filter::{GradeBand, YearRange};
use crate::record::{Enrollment, EnrollmentRecord};

/// Lowest and highest grade present in the enrollment data.
pub const MIN_GRADE: u8 = 7;
pub const MAX_GRADE: u8 = 12;

/// Display labels for the program codes used by the enrollment office.
pub const CODE_LABELS: &[(&str, &str)] = &[
    ("A", "Arts (A)"),
    ("C", "Community Service (C)"),
    ("E", "Exempt (E)"),
    ("IP", "Independent Project (IP)"),
    ("L", "Leave (L)"),
    ("O", "Other (O)"),
    ("S", "Sports (S)"),
    ("SA", "Semester Abroad (SA)"),
    ("SC", "Strength & Conditioning (SC)"),
    ("TM", "Team Manager (TM)"),
];

/// Label for a program code; unknown codes label as themselves.
pub fn code_label(code: &str) -> &str {
    CODE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or(code)
}

/// Failure while loading the enrollment CSV.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed enrollment CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}

/// All enrollment records, each with its derived full program name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    enrollments: Vec<Enrollment>,
}

impl Dataset {
    /// Build a dataset from in-memory records.
    pub fn from_records(records: impl IntoIterator<Item = EnrollmentRecord>) -> Self {
        Self {
            enrollments: records.into_iter().map(Enrollment::new).collect(),
        }
    }

    /// Load the enrollment CSV at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        log::info!(
            "loaded {} enrollments ({} students) from {}",
            dataset.len(),
            dataset.student_count(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse enrollment CSV (with header row) from any reader.
    ///
    /// Cells are trimmed; empty optional cells are absent. Columns not part
    /// of [`EnrollmentRecord`] are ignored.
    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record: EnrollmentRecord = row.deserialize(Some(&headers))?;
            validate(&record, line)?;
            records.push(record);
        }
        Ok(Self::from_records(records))
    }

    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrollments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Enrollment> {
        self.enrollments.iter()
    }

    pub fn len(&self) -> usize {
        self.enrollments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enrollments.is_empty()
    }

    /// Number of distinct students.
    pub fn student_count(&self) -> usize {
        self.iter()
            .map(Enrollment::person_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Sorted distinct program codes.
    pub fn codes(&self) -> BTreeSet<String> {
        self.iter().map(|e| e.record.program_code.clone()).collect()
    }

    /// Sorted distinct academic years.
    pub fn years(&self) -> Vec<i32> {
        self.iter()
            .map(|e| e.record.academic_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Full span of academic years, or `None` for an empty dataset.
    pub fn year_range(&self) -> Option<YearRange> {
        YearRange::spanning(&self.years())
    }

    /// Distinct base program names, ordered by program code then name.
    pub fn program_names(&self) -> Vec<String> {
        let mut by_code: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for e in self.iter() {
            if let Some(name) = e.record.program_name.as_deref() {
                by_code
                    .entry(e.record.program_code.as_str())
                    .or_default()
                    .insert(name);
            }
        }
        let mut seen = BTreeSet::new();
        by_code
            .into_values()
            .flatten()
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// Dashboard option lists derived from the data.
    pub fn catalog(&self) -> Catalog {
        Catalog {
            codes: self
                .codes()
                .into_iter()
                .map(|code| CodeEntry {
                    label: code_label(&code).to_string(),
                    code,
                })
                .collect(),
            years: self.years(),
            programs: self.program_names(),
            grade_bands: GradeBand::ALL
                .iter()
                .map(|band| GradeBandEntry {
                    key: band.as_str(),
                    label: band.label(),
                })
                .collect(),
            enrollments: self.len(),
            students: self.student_count(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Enrollment;
    type IntoIter = std::slice::Iter<'a, Enrollment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate(record: &EnrollmentRecord, line: u64) -> Result<(), DatasetError> {
    if record.person_id.trim().is_empty() {
        return Err(DatasetError::InvalidRecord {
            line,
            reason: "blank Person ID".to_string(),
        });
    }
    if !(MIN_GRADE..=MAX_GRADE).contains(&record.grade) {
        return Err(DatasetError::InvalidRecord {
            line,
            reason: format!(
                "grade {} outside {MIN_GRADE}-{MAX_GRADE}",
                record.grade
            ),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Option lists for the dashboard controls.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub codes: Vec<CodeEntry>,
    pub years: Vec<i32>,
    pub programs: Vec<String>,
    pub grade_bands: Vec<GradeBandEntry>,
    pub enrollments: usize,
    pub students: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeEntry {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeBandEntry {
    pub key: &'static str,
    pub label: &'static str,
}
