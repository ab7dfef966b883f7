//! The program-association pipeline, end to end.
//!
//! filter → top-N selection → co-enrollment index → pairwise Cramer's V →
//! matrix. Each call recomputes everything from the dataset; nothing is
//! cached between calls, so concurrent callers only share the read-only
//! [`Dataset`].

use std::collections::BTreeSet;

use serde::Serialize;

use enrollscope_stats::CramersVariant;

use crate::association::{PairAssociation, associate_all};
use crate::dataset::Dataset;
use crate::filter::{GradeBand, YearRange, filter};
use crate::index::build_index;
use crate::matrix::{AssociationMatrix, HeatmapFigure, build};
use crate::top::{DEFAULT_ASSOCIATION_TOP_N, TopProgramSet, restrict_to_top, select_top};

/// Inputs of one association heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationQuery {
    pub years: YearRange,
    pub codes: BTreeSet<String>,
    pub grades: GradeBand,
    pub top_n: usize,
    pub variant: CramersVariant,
}

impl AssociationQuery {
    /// Query with the heatmap defaults: top 12, plain Cramer's V.
    pub fn new(years: YearRange, codes: BTreeSet<String>, grades: GradeBand) -> Self {
        Self {
            years,
            codes,
            grades,
            top_n: DEFAULT_ASSOCIATION_TOP_N,
            variant: CramersVariant::Plain,
        }
    }

    /// Every year and code in `dataset`, high-school grades.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let years = dataset.year_range().unwrap_or(YearRange::new(0, 0));
        Self::new(years, dataset.codes(), GradeBand::Hs)
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_variant(mut self, variant: CramersVariant) -> Self {
        self.variant = variant;
        self
    }
}

/// The matrix plus the intermediate results that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationReport {
    pub query: AssociationQuery,
    /// Enrollments matching the year/code/grade filter.
    pub filtered_enrollments: usize,
    /// Distinct students in the top-program-filtered window.
    pub universe_size: usize,
    pub top_programs: TopProgramSet,
    pub pairs: Vec<PairAssociation>,
    pub matrix: AssociationMatrix,
}

impl AssociationReport {
    pub fn heatmap(&self) -> HeatmapFigure {
        HeatmapFigure::from_matrix(&self.matrix)
    }

    /// The pairwise result for two programs, in either order.
    pub fn pair(&self, a: &str, b: &str) -> Option<&PairAssociation> {
        self.pairs.iter().find(|p| {
            (p.program_a == a && p.program_b == b) || (p.program_a == b && p.program_b == a)
        })
    }
}

/// Run the association pipeline for `query` over `dataset`.
///
/// Never fails: empty filters yield an empty matrix, a single program yields
/// a 1×1 matrix, and degenerate pairs contribute 0.0.
pub fn association_matrix(dataset: &Dataset, query: &AssociationQuery) -> AssociationReport {
    let filtered = filter(dataset, query.years, &query.codes, query.grades);
    let top_programs = select_top(&filtered, query.top_n);
    let universe = restrict_to_top(&filtered, &top_programs);
    let index = build_index(dataset, &top_programs, &universe);
    let pairs = associate_all(&index, query.variant);
    let matrix = build(index.programs(), &pairs);

    log::info!(
        "association matrix {}x{} ({} pairs, {} variant) from {} enrollments",
        matrix.len(),
        matrix.len(),
        pairs.len(),
        query.variant.as_str(),
        filtered.len()
    );

    AssociationReport {
        query: query.clone(),
        filtered_enrollments: filtered.len(),
        universe_size: index.universe().len(),
        top_programs,
        pairs,
        matrix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EnrollmentRecord;

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for s in 0..40u32 {
            let id = format!("s{s}");
            let grade = 9 + (s % 4) as u8;
            records.push(EnrollmentRecord::new(&id, "Crew", "S", 2019, grade));
            if s % 2 == 0 {
                records.push(EnrollmentRecord::new(&id, "Chorus", "A", 2020, grade));
            }
            if s % 3 == 0 {
                records.push(EnrollmentRecord::new(&id, "Robotics", "O", 2020, grade));
            }
            if s % 5 == 0 {
                records.push(EnrollmentRecord::new(&id, "Soccer", "S", 2021, grade));
            }
        }
        Dataset::from_records(records)
    }

    #[test]
    fn test_for_dataset_defaults() {
        let ds = dataset();
        let q = AssociationQuery::for_dataset(&ds);
        assert_eq!(q.years, YearRange::new(2019, 2021));
        assert_eq!(q.grades, GradeBand::Hs);
        assert_eq!(q.top_n, 12);
        assert_eq!(q.codes.len(), 3);
    }

    #[test]
    fn test_report_pair_lookup_either_order() {
        let ds = dataset();
        let report = association_matrix(&ds, &AssociationQuery::for_dataset(&ds));
        assert_eq!(report.matrix.len(), 4);
        assert_eq!(report.pairs.len(), 6);
        let ab = report.pair("Crew", "Chorus").unwrap();
        let ba = report.pair("Chorus", "Crew").unwrap();
        assert_eq!(ab, ba);
        assert!(report.pair("Crew", "Crew").is_none());
    }

    #[test]
    fn test_middle_school_window_is_empty() {
        let ds = dataset();
        let q = AssociationQuery::for_dataset(&ds);
        let q = AssociationQuery::new(q.years, q.codes, GradeBand::Ms);
        let report = association_matrix(&ds, &q);
        assert!(report.matrix.is_empty());
        assert_eq!(report.universe_size, 0);
        assert!(report.heatmap().z.is_empty());
    }

    #[test]
    fn test_variant_is_recorded() {
        let ds = dataset();
        let q = AssociationQuery::for_dataset(&ds).with_variant(CramersVariant::BiasCorrected);
        let report = association_matrix(&ds, &q);
        assert_eq!(report.query.variant, CramersVariant::BiasCorrected);
        assert!(report.matrix.is_symmetric());
    }
}
