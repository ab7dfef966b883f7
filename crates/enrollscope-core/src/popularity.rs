//! Count aggregations behind the popularity ranking, treemap and enrollment
//! bar charts.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dataset::Dataset;
use crate::filter::{EnrollmentFilter, YearRange};
use crate::record::{Attribute, Enrollment};
use crate::top::{ProgramCount, rank_by_count, select_top};

/// Programs kept per demographic group in the treemap.
pub const TREEMAP_PROGRAMS_PER_GROUP: usize = 10;

/// Treemap grouping when none is requested: race/ethnicity, then gender.
pub const DEFAULT_TREEMAP_DIMENSIONS: [Attribute; 2] =
    [Attribute::RaceEthnicity, Attribute::Gender];

/// The `n` most enrolled program variants under `filter`.
pub fn popularity(dataset: &Dataset, filter: &EnrollmentFilter, n: usize) -> Vec<ProgramCount> {
    select_top(&filter.apply(dataset), n).entries().to_vec()
}

// ---------------------------------------------------------------------------
// Treemap
// ---------------------------------------------------------------------------

/// One treemap rectangle: group values along `dimensions`, then the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreemapLeaf {
    pub path: Vec<String>,
    pub total: usize,
}

/// Enrollment totals per `(dimension values..., program name)`, keeping the
/// ten largest programs inside each dimension group.
///
/// Leaves are ordered by total, largest first; ties keep first-seen order.
/// Records missing a dimension value group under `"Unknown"`; records with
/// no program name are skipped.
pub fn treemap(
    dataset: &Dataset,
    years: YearRange,
    codes: &BTreeSet<String>,
    dimensions: &[Attribute],
) -> Vec<TreemapLeaf> {
    let filter = EnrollmentFilter::new(years).with_codes(codes.iter().cloned());
    let keys = dataset
        .iter()
        .filter(|e| filter.matches(e))
        .filter_map(|e| {
            let program = e.record.program_name.clone()?;
            let mut path: Vec<String> = dimensions
                .iter()
                .map(|d| d.group_value(&e.record))
                .collect();
            path.push(program);
            Some(path)
        });

    let mut per_group: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    let mut leaves = Vec::new();
    for (path, total) in rank_by_count(keys) {
        let group = path[..dimensions.len()].to_vec();
        let kept = per_group.entry(group).or_default();
        if *kept < TREEMAP_PROGRAMS_PER_GROUP {
            *kept += 1;
            leaves.push(TreemapLeaf { path, total });
        }
    }
    leaves
}

// ---------------------------------------------------------------------------
// Enrollment bar charts
// ---------------------------------------------------------------------------

/// Row count for one program and colour group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentCount {
    pub program: String,
    pub group: String,
    pub count: usize,
}

/// Row count for one academic year, facet and colour group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineCount {
    pub year: i32,
    pub facet: String,
    pub group: String,
    pub count: usize,
}

fn program_of(e: &Enrollment) -> Option<&str> {
    e.record.program_name.as_deref()
}

/// Total enrollment per base program, split by `color`. Sorted by program
/// then group.
pub fn enrollment_counts(
    dataset: &Dataset,
    filter: &EnrollmentFilter,
    color: Attribute,
) -> Vec<EnrollmentCount> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for e in filter.apply(dataset).iter() {
        let Some(program) = program_of(e) else {
            continue;
        };
        *counts
            .entry((program.to_string(), color.group_value(&e.record)))
            .or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((program, group), count)| EnrollmentCount {
            program,
            group,
            count,
        })
        .collect()
}

/// Enrollment per academic year, faceted by `facet` and split by `color`.
/// Sorted by facet, year, then group.
pub fn enrollment_timeline(
    dataset: &Dataset,
    filter: &EnrollmentFilter,
    facet: Attribute,
    color: Attribute,
) -> Vec<TimelineCount> {
    let mut counts: BTreeMap<(String, i32, String), usize> = BTreeMap::new();
    for e in filter.apply(dataset).iter() {
        let key = (
            facet.group_value(&e.record),
            e.record.academic_year,
            color.group_value(&e.record),
        );
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((facet, year, group), count)| TimelineCount {
            year,
            facet,
            group,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::GradeBand;
    use crate::record::{EnrollmentRecord, UNKNOWN_GROUP};

    fn rec(
        id: &str,
        program: &str,
        code: &str,
        year: i32,
        grade: u8,
        gender: Option<&str>,
    ) -> EnrollmentRecord {
        let mut r = EnrollmentRecord::new(id, program, code, year, grade);
        r.gender = gender.map(str::to_string);
        r
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            rec("1", "Crew", "S", 2019, 9, Some("F")),
            rec("2", "Crew", "S", 2019, 10, Some("M")),
            rec("3", "Crew", "S", 2020, 11, Some("F")),
            rec("4", "Chorus", "A", 2020, 8, Some("F")),
            rec("5", "Chorus", "A", 2021, 12, None),
            rec("6", "Soccer", "S", 2021, 12, Some("M")),
        ])
    }

    #[test]
    fn test_popularity() {
        let ds = dataset();
        let filter = EnrollmentFilter::new(YearRange::new(2019, 2021)).with_grades(GradeBand::Hs);
        let top = popularity(&ds, &filter, 15);
        assert_eq!(top[0], ProgramCount { program: "Crew".into(), count: 3 });
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_treemap_groups_by_dimension() {
        let ds = dataset();
        let codes: BTreeSet<String> = ["S", "A"].iter().map(|s| s.to_string()).collect();
        let leaves = treemap(&ds, YearRange::new(2019, 2021), &codes, &[Attribute::Gender]);
        assert_eq!(
            leaves[0],
            TreemapLeaf { path: vec!["F".into(), "Crew".into()], total: 2 }
        );
        let unknown_chorus = vec![UNKNOWN_GROUP.to_string(), "Chorus".to_string()];
        assert!(leaves.iter().any(|l| l.path == unknown_chorus));
        let total: usize = leaves.iter().map(|l| l.total).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_treemap_caps_programs_per_group() {
        let records =
            (0..15).map(|i| rec(&format!("{i}"), &format!("P{i}"), "S", 2020, 10, Some("F")));
        let ds = Dataset::from_records(records);
        let codes: BTreeSet<String> = ["S".to_string()].into_iter().collect();
        let leaves = treemap(&ds, YearRange::new(2020, 2020), &codes, &[Attribute::Gender]);
        assert_eq!(leaves.len(), TREEMAP_PROGRAMS_PER_GROUP);
    }

    #[test]
    fn test_enrollment_counts_by_color() {
        let ds = dataset();
        let filter =
            EnrollmentFilter::new(YearRange::new(2019, 2021)).with_programs(["Crew", "Chorus"]);
        let counts = enrollment_counts(&ds, &filter, Attribute::Gender);
        assert_eq!(counts.len(), 4);
        let crew_f = counts.iter().find(|c| c.program == "Crew" && c.group == "F").unwrap();
        assert_eq!(crew_f.count, 2);
    }

    #[test]
    fn test_enrollment_timeline() {
        let ds = dataset();
        let filter = EnrollmentFilter::new(YearRange::new(2019, 2021));
        let timeline = enrollment_timeline(&ds, &filter, Attribute::ProgramName, Attribute::Gender);
        let crew_2019: usize = timeline
            .iter()
            .filter(|t| t.facet == "Crew" && t.year == 2019)
            .map(|t| t.count)
            .sum();
        assert_eq!(crew_2019, 2);
        assert_eq!(timeline.iter().map(|t| t.count).sum::<usize>(), 6);
    }
}
