//! Record selection: year window, program codes, program names, grade band,
//! and free-form attribute predicates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::record::{Attribute, Enrollment};

// ---------------------------------------------------------------------------
// Grade bands
// ---------------------------------------------------------------------------

/// Coarse grouping of student grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeBand {
    /// Grades 9–12.
    Hs,
    /// Grades 7–8.
    Ms,
    #[default]
    All,
}

impl GradeBand {
    pub const ALL: [GradeBand; 3] = [GradeBand::Hs, GradeBand::Ms, GradeBand::All];

    /// `"hs"` and `"ms"` select their band; anything else selects all grades.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "hs" => Self::Hs,
            "ms" => Self::Ms,
            _ => Self::All,
        }
    }

    pub fn grades(self) -> &'static [u8] {
        match self {
            Self::Hs => &[9, 10, 11, 12],
            Self::Ms => &[7, 8],
            Self::All => &[7, 8, 9, 10, 11, 12],
        }
    }

    pub fn contains(self, grade: u8) -> bool {
        self.grades().contains(&grade)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hs => "hs",
            Self::Ms => "ms",
            Self::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hs => "High school only (9-12)",
            Self::Ms => "Middle school only (7-8)",
            Self::All => "All years",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Hs => Self::Ms,
            Self::Ms => Self::All,
            Self::All => Self::Hs,
        }
    }
}

// ---------------------------------------------------------------------------
// Year range
// ---------------------------------------------------------------------------

/// Inclusive academic-year window. Bounds are normalized so `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Window spanning the smallest and largest of `years`.
    pub fn spanning(years: &[i32]) -> Option<Self> {
        let start = *years.iter().min()?;
        let end = *years.iter().max()?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

// ---------------------------------------------------------------------------
// Enrollment filter
// ---------------------------------------------------------------------------

/// Conjunction of year window, grade band, and optional code / program-name
/// membership. A `None` set matches everything; an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentFilter {
    pub years: YearRange,
    pub codes: Option<BTreeSet<String>>,
    pub programs: Option<BTreeSet<String>>,
    pub grades: GradeBand,
}

impl EnrollmentFilter {
    pub fn new(years: YearRange) -> Self {
        Self {
            years,
            codes: None,
            programs: None,
            grades: GradeBand::All,
        }
    }

    pub fn with_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_programs<I, S>(mut self, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.programs = Some(programs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_grades(mut self, grades: GradeBand) -> Self {
        self.grades = grades;
        self
    }

    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        let r = &enrollment.record;
        self.years.contains(r.academic_year)
            && self.grades.contains(r.grade)
            && self
                .codes
                .as_ref()
                .is_none_or(|codes| codes.contains(&r.program_code))
            && self.programs.as_ref().is_none_or(|programs| {
                r.program_name
                    .as_ref()
                    .is_some_and(|name| programs.contains(name))
            })
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredEnrollmentSet<'a> {
        let set: FilteredEnrollmentSet<'a> = dataset.iter().filter(|e| self.matches(e)).collect();
        log::debug!(
            "filter years={}..={} grades={} matched {}/{} enrollments",
            self.years.start(),
            self.years.end(),
            self.grades.as_str(),
            set.len(),
            dataset.len()
        );
        set
    }
}

/// Select enrollments with `program_code ∈ codes`, academic year inside
/// `years`, and grade inside `grades`.
pub fn filter<'a>(
    dataset: &'a Dataset,
    years: YearRange,
    codes: &BTreeSet<String>,
    grades: GradeBand,
) -> FilteredEnrollmentSet<'a> {
    EnrollmentFilter::new(years)
        .with_codes(codes.iter().cloned())
        .with_grades(grades)
        .apply(dataset)
}

/// Split a comma-separated code list, dropping blanks.
pub fn parse_codes(s: &str) -> BTreeSet<String> {
    parse_list(s).into_iter().collect()
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Filtered set
// ---------------------------------------------------------------------------

/// Borrowed subset of a dataset, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct FilteredEnrollmentSet<'a> {
    enrollments: Vec<&'a Enrollment>,
}

impl<'a> FilteredEnrollmentSet<'a> {
    pub fn len(&self) -> usize {
        self.enrollments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enrollments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Enrollment> + '_ {
        self.enrollments.iter().copied()
    }

    pub fn as_slice(&self) -> &[&'a Enrollment] {
        &self.enrollments
    }

    /// Keep only enrollments satisfying `keep`.
    pub fn retain(mut self, mut keep: impl FnMut(&Enrollment) -> bool) -> Self {
        self.enrollments.retain(|e| keep(e));
        self
    }
}

impl<'a> FromIterator<&'a Enrollment> for FilteredEnrollmentSet<'a> {
    fn from_iter<T: IntoIterator<Item = &'a Enrollment>>(iter: T) -> Self {
        Self {
            enrollments: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute predicates
// ---------------------------------------------------------------------------

/// `attribute == value` test used for ad-hoc exploration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePredicate {
    pub attribute: Attribute,
    pub value: String,
}

impl AttributePredicate {
    /// Parse `key=value`, e.g. `gender=F` or `code=S`.
    pub fn parse(s: &str) -> Option<Self> {
        let (key, value) = s.split_once('=')?;
        Some(Self {
            attribute: Attribute::parse(key)?,
            value: value.trim().to_string(),
        })
    }

    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        self.attribute
            .value(&enrollment.record)
            .is_some_and(|v| v == self.value)
    }
}

/// Enrollments satisfying every predicate. No predicates selects everything.
pub fn select_where<'a>(
    dataset: &'a Dataset,
    predicates: &[AttributePredicate],
) -> FilteredEnrollmentSet<'a> {
    dataset
        .iter()
        .filter(|e| predicates.iter().all(|p| p.matches(e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EnrollmentRecord;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            EnrollmentRecord::new("1", "Crew", "S", 2018, 9),
            EnrollmentRecord::new("2", "Crew", "S", 2019, 7),
            EnrollmentRecord::new("3", "Chorus", "A", 2019, 10),
            EnrollmentRecord::new("4", "Chorus", "A", 2021, 12),
            EnrollmentRecord::new("5", "Robotics", "O", 2020, 8),
        ])
    }

    fn codes(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_grade_band_parse() {
        assert_eq!(GradeBand::parse("hs"), GradeBand::Hs);
        assert_eq!(GradeBand::parse("ms"), GradeBand::Ms);
        assert_eq!(GradeBand::parse("all"), GradeBand::All);
        assert_eq!(GradeBand::parse("kindergarten"), GradeBand::All);
        assert_eq!(GradeBand::Hs.grades(), &[9, 10, 11, 12]);
        assert_eq!(GradeBand::Ms.grades(), &[7, 8]);
        assert_eq!(GradeBand::All.grades().len(), 6);
    }

    #[test]
    fn test_year_range_normalizes() {
        let r = YearRange::new(2021, 2018);
        assert_eq!((r.start(), r.end()), (2018, 2021));
        assert!(r.contains(2018) && r.contains(2021));
        assert!(!r.contains(2022));
        assert_eq!(YearRange::spanning(&[2020, 2017, 2019]), Some(YearRange::new(2017, 2020)));
        assert_eq!(YearRange::spanning(&[]), None);
    }

    #[test]
    fn test_filter_years_codes_grades() {
        let ds = dataset();
        let set = filter(&ds, YearRange::new(2018, 2020), &codes(&["S", "A"]), GradeBand::Hs);
        let ids: Vec<&str> = set.iter().map(|e| e.person_id()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_filter_empty_codes_is_empty() {
        let ds = dataset();
        let set = filter(&ds, YearRange::new(2000, 2030), &BTreeSet::new(), GradeBand::All);
        assert!(set.is_empty());
    }

    #[test]
    fn test_filter_unknown_code_matches_nothing() {
        let ds = dataset();
        let set = filter(&ds, YearRange::new(2000, 2030), &codes(&["??"]), GradeBand::All);
        assert!(set.is_empty());
    }

    #[test]
    fn test_filter_by_program_name() {
        let ds = dataset();
        let set = EnrollmentFilter::new(YearRange::new(2000, 2030))
            .with_programs(["Chorus"])
            .apply(&ds);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_predicates() {
        let ds = dataset();
        let preds = vec![
            AttributePredicate::parse("code=A").unwrap(),
            AttributePredicate::parse("year = 2019").unwrap(),
        ];
        let set = select_where(&ds, &preds);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].person_id(), "3");
        assert!(AttributePredicate::parse("nonsense").is_none());
        assert!(AttributePredicate::parse("shoe=9").is_none());
        assert_eq!(select_where(&ds, &[]).len(), ds.len());
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_codes(" S, A,,SC "), codes(&["S", "A", "SC"]));
        assert!(parse_codes("").is_empty());
    }
}
