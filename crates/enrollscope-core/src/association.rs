//! Pairwise program association via Cramer's V.

use serde::Serialize;

use enrollscope_stats::{
    ChiSquaredResult, ContingencyTable, CramersVariant, cramers_v_from_chi2, pearson_chi_squared,
    round_to,
};

use crate::index::CoEnrollmentIndex;

/// Association between two top programs, with the table it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAssociation {
    pub program_a: String,
    pub program_b: String,
    pub table: ContingencyTable,
    pub chi_squared: ChiSquaredResult,
    /// Cramer's V rounded to 4 decimals; 0.0 for degenerate tables.
    pub cramers_v: f64,
}

/// Cramer's V for the programs at positions `a` and `b`.
pub fn associate_at(
    index: &CoEnrollmentIndex<'_>,
    a: usize,
    b: usize,
    variant: CramersVariant,
) -> PairAssociation {
    let table = index.contingency_at(a, b);
    let chi_squared = pearson_chi_squared(&table, variant.continuity_correction());
    let cramers_v = round_to(cramers_v_from_chi2(&table, &chi_squared, variant), 4);
    let (program_a, program_b) = (&index.programs()[a], &index.programs()[b]);
    if chi_squared.degenerate {
        log::warn!("degenerate table for ({program_a}, {program_b}): {table:?}, using 0.0");
    }
    PairAssociation {
        program_a: program_a.clone(),
        program_b: program_b.clone(),
        table,
        chi_squared,
        cramers_v,
    }
}

/// Cramer's V between two programs in `index`, in `[0, 1]`.
///
/// Unknown programs and degenerate tables both yield 0.0.
pub fn associate(
    index: &CoEnrollmentIndex<'_>,
    program_a: &str,
    program_b: &str,
    variant: CramersVariant,
) -> f64 {
    match (index.position(program_a), index.position(program_b)) {
        (Some(a), Some(b)) => associate_at(index, a, b, variant).cramers_v,
        _ => 0.0,
    }
}

/// Every unordered pair `(i, j)` with `i < j`, in index order. Row/column
/// roles follow selection order, so results are deterministic.
pub fn associate_all(
    index: &CoEnrollmentIndex<'_>,
    variant: CramersVariant,
) -> Vec<PairAssociation> {
    let n = index.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(associate_at(index, i, j, variant));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::filter::{EnrollmentFilter, YearRange};
    use crate::index::build_index;
    use crate::record::EnrollmentRecord;
    use crate::top::{restrict_to_top, select_top};

    /// 36 students: 7 in both, 12 only A, 9 only B, 8 in a third program.
    fn dataset() -> Dataset {
        let mut records = Vec::new();
        let mut id = 0;
        let mut add = |programs: &[&str], count: usize, records: &mut Vec<EnrollmentRecord>| {
            for _ in 0..count {
                id += 1;
                for p in programs {
                    records.push(EnrollmentRecord::new(format!("s{id}"), *p, "S", 2020, 10));
                }
            }
        };
        add(&["A", "B"], 7, &mut records);
        add(&["A"], 12, &mut records);
        add(&["B"], 9, &mut records);
        add(&["C"], 8, &mut records);
        Dataset::from_records(records)
    }

    #[test]
    fn test_pipeline_pair_matches_known_value() {
        let ds = dataset();
        let window = EnrollmentFilter::new(YearRange::new(2020, 2020)).apply(&ds);
        let top = select_top(&window, 12);
        let universe = restrict_to_top(&window, &top);
        let index = build_index(&ds, &top, &universe);

        let (a, b) = (index.position("A").unwrap(), index.position("B").unwrap());
        let pair = associate_at(&index, a, b, CramersVariant::Plain);
        assert_eq!(pair.table.cells(), &[vec![7, 12], vec![9, 8]]);
        assert_eq!(pair.cramers_v, 0.1617);
        assert_eq!(associate(&index, "B", "A", CramersVariant::Plain), 0.1617);
        assert_eq!(associate(&index, "A", "missing", CramersVariant::Plain), 0.0);
    }

    #[test]
    fn test_associate_all_pairs_order() {
        let ds = dataset();
        let window = EnrollmentFilter::new(YearRange::new(2020, 2020)).apply(&ds);
        let top = select_top(&window, 12);
        let universe = restrict_to_top(&window, &top);
        let index = build_index(&ds, &top, &universe);

        let pairs = associate_all(&index, CramersVariant::Plain);
        assert_eq!(pairs.len(), 3);
        for p in &pairs {
            assert!((0.0..=1.0).contains(&p.cramers_v));
            assert_eq!(p.table.total(), index.universe().len() as u64);
            let pa = index.position(&p.program_a).unwrap();
            let pb = index.position(&p.program_b).unwrap();
            assert!(pa < pb);
        }
    }

    #[test]
    fn test_program_taken_by_everyone_is_zero() {
        let ds = Dataset::from_records(vec![
            EnrollmentRecord::new("1", "Crew", "S", 2020, 10),
            EnrollmentRecord::new("2", "Crew", "S", 2020, 10),
            EnrollmentRecord::new("1", "Chorus", "A", 2020, 10),
        ]);
        let window = EnrollmentFilter::new(YearRange::new(2020, 2020)).apply(&ds);
        let top = select_top(&window, 12);
        let universe = restrict_to_top(&window, &top);
        let index = build_index(&ds, &top, &universe);
        let pair = associate_at(&index, 0, 1, CramersVariant::Plain);
        assert!(pair.chi_squared.degenerate);
        assert_eq!(pair.cramers_v, 0.0);
    }
}
