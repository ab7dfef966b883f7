//! Association statistics for categorical co-occurrence data.
//!
//! Provides r×k contingency tables, Pearson's chi-squared statistic (with the
//! optional Yates continuity correction on one-degree-of-freedom tables), its
//! upper-tail p-value, and Cramer's V in two formulations. Every function is
//! total: degenerate tables yield a documented fallback instead of NaN.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

// ═══════════════════════════════════════════════════════════════════════════════
// Contingency table
// ═══════════════════════════════════════════════════════════════════════════════

/// Rectangular table of non-negative co-occurrence counts.
///
/// For a pair of programs (A, B) over a universe U the 2×2 layout is:
///
/// ```text
/// | A & B  | A only  |
/// | B only | Neither |
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContingencyTable {
    cells: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Build a table from row-major counts. Returns `None` for an empty or
    /// ragged input.
    pub fn new(cells: Vec<Vec<u64>>) -> Option<Self> {
        let cols = cells.first()?.len();
        if cols == 0 || cells.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Self { cells })
    }

    /// The 2×2 table for a pair of binary memberships.
    pub fn two_by_two(both: u64, first_only: u64, second_only: u64, neither: u64) -> Self {
        Self {
            cells: vec![vec![both, first_only], vec![second_only, neither]],
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.cells.len(), self.cells[0].len())
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.cells[row][col]
    }

    pub fn cells(&self) -> &[Vec<u64>] {
        &self.cells
    }

    /// Grand total of all cells.
    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn row_totals(&self) -> Vec<u64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<u64> {
        let (_, cols) = self.shape();
        (0..cols)
            .map(|c| self.cells.iter().map(|row| row[c]).sum())
            .collect()
    }

    /// Degrees of freedom `(r-1)(k-1)`.
    pub fn degrees_of_freedom(&self) -> usize {
        let (rows, cols) = self.shape();
        (rows - 1) * (cols - 1)
    }

    /// True when the chi-squared statistic is undefined: a zero marginal
    /// total, an empty table, or a single row/column.
    pub fn is_degenerate(&self) -> bool {
        self.degrees_of_freedom() == 0
            || self.total() == 0
            || self.row_totals().contains(&0)
            || self.col_totals().contains(&0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Chi-squared
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a Pearson chi-squared test of independence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChiSquaredResult {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
    /// The table had a zero marginal; statistic is reported as 0.0 and p as 1.0.
    pub degenerate: bool,
}

impl ChiSquaredResult {
    fn degenerate(dof: usize) -> Self {
        Self {
            statistic: 0.0,
            dof,
            p_value: 1.0,
            degenerate: true,
        }
    }
}

/// Pearson's chi-squared statistic: Σ (observed − expected)² / expected.
///
/// With `continuity_correction` set, one-degree-of-freedom tables have each
/// observed count moved up to 0.5 toward its expected count (Yates). Tables
/// with more degrees of freedom are never corrected.
pub fn pearson_chi_squared(
    table: &ContingencyTable,
    continuity_correction: bool,
) -> ChiSquaredResult {
    let dof = table.degrees_of_freedom();
    if table.is_degenerate() {
        return ChiSquaredResult::degenerate(dof);
    }

    let n = table.total() as f64;
    let row_totals = table.row_totals();
    let col_totals = table.col_totals();
    let yates = continuity_correction && dof == 1;

    let mut statistic = 0.0;
    for (r, row) in table.cells().iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let expected = row_totals[r] as f64 * col_totals[c] as f64 / n;
            let mut observed = count as f64;
            if yates {
                let diff = expected - observed;
                observed += diff.signum() * diff.abs().min(0.5);
            }
            let dev = observed - expected;
            statistic += dev * dev / expected;
        }
    }

    let p_value = ChiSquared::new(dof as f64)
        .map(|dist| dist.sf(statistic))
        .unwrap_or(1.0);

    ChiSquaredResult {
        statistic,
        dof,
        p_value,
        degenerate: false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Cramer's V
// ═══════════════════════════════════════════════════════════════════════════════

/// Which Cramer's V formulation to apply.
///
/// A matrix must be computed with a single variant throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CramersVariant {
    /// `sqrt((χ²/n) / min(r-1, k-1))` with uncorrected χ².
    #[default]
    Plain,
    /// Bias-corrected φ² with corrected r and k, over a Yates-corrected χ²
    /// for one-degree-of-freedom tables.
    BiasCorrected,
}

impl CramersVariant {
    /// Parse a variant name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "plain" | "uncorrected" => Some(Self::Plain),
            "bias_corrected" | "bias-corrected" | "corrected" => Some(Self::BiasCorrected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::BiasCorrected => "bias_corrected",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Plain => Self::BiasCorrected,
            Self::BiasCorrected => Self::Plain,
        }
    }

    /// Whether this variant's chi-squared uses the continuity correction.
    pub fn continuity_correction(self) -> bool {
        matches!(self, Self::BiasCorrected)
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Cramer's V from an already computed chi-squared statistic.
///
/// Returns the unrounded coefficient, or 0.0 whenever the formula is
/// undefined.
pub fn cramers_v_from_chi2(
    table: &ContingencyTable,
    chi2: &ChiSquaredResult,
    variant: CramersVariant,
) -> f64 {
    if chi2.degenerate {
        return 0.0;
    }
    let n = table.total() as f64;
    let (rows, cols) = table.shape();
    let (r, k) = (rows as f64, cols as f64);
    let phi2 = chi2.statistic / n;

    let v = match variant {
        CramersVariant::Plain => {
            let denom = (r - 1.0).min(k - 1.0);
            (phi2 / denom).sqrt()
        }
        CramersVariant::BiasCorrected => {
            if n <= 1.0 {
                return 0.0;
            }
            let phi2_corr = (phi2 - (k - 1.0) * (r - 1.0) / (n - 1.0)).max(0.0);
            let r_corr = r - (r - 1.0).powi(2) / (n - 1.0);
            let k_corr = k - (k - 1.0).powi(2) / (n - 1.0);
            let denom = (k_corr - 1.0).min(r_corr - 1.0);
            if denom <= 0.0 {
                return 0.0;
            }
            (phi2_corr / denom).sqrt()
        }
    };

    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// Cramer's V for a contingency table, rounded to 4 decimal places.
///
/// Degenerate tables (any zero marginal) map to 0.0.
pub fn cramers_v(table: &ContingencyTable, variant: CramersVariant) -> f64 {
    let chi2 = pearson_chi_squared(table, variant.continuity_correction());
    round_to(cramers_v_from_chi2(table, &chi2, variant), 4)
}

/// Plain Cramer's V without continuity correction, rounded to 4 decimals.
pub fn calculate_cramers_v(table: &ContingencyTable) -> f64 {
    cramers_v(table, CramersVariant::Plain)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cells: &[&[u64]]) -> ContingencyTable {
        ContingencyTable::new(cells.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_known_two_by_two() {
        let t = table(&[&[7, 12], &[9, 8]]);
        assert_eq!(calculate_cramers_v(&t), 0.1617);
    }

    #[test]
    fn test_known_three_by_two() {
        let t = table(&[&[6, 9], &[8, 5], &[12, 9]]);
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(calculate_cramers_v(&t), 0.1775);
    }

    #[test]
    fn test_chi_squared_statistic_and_p_value() {
        let t = table(&[&[7, 12], &[9, 8]]);
        let result = pearson_chi_squared(&t, false);
        assert_eq!(result.dof, 1);
        assert!((result.statistic - 0.941_795_665_6).abs() < 1e-9);
        assert!((result.p_value - 0.331_816).abs() < 1e-5);
        assert!(!result.degenerate);
    }

    #[test]
    fn test_yates_only_reduces_one_dof_tables() {
        let t = table(&[&[7, 12], &[9, 8]]);
        let corrected = pearson_chi_squared(&t, true);
        assert!((corrected.statistic - 0.402_631_578_9).abs() < 1e-9);

        let wide = table(&[&[6, 9], &[8, 5], &[12, 9]]);
        let a = pearson_chi_squared(&wide, false);
        let b = pearson_chi_squared(&wide, true);
        assert_eq!(a.statistic, b.statistic);
    }

    #[test]
    fn test_bias_corrected_variant() {
        let t = table(&[&[30, 10], &[10, 30]]);
        assert_eq!(cramers_v(&t, CramersVariant::Plain), 0.5);
        assert_eq!(cramers_v(&t, CramersVariant::BiasCorrected), 0.4644);
        // Weak association is corrected down to zero.
        let weak = table(&[&[7, 12], &[9, 8]]);
        assert_eq!(cramers_v(&weak, CramersVariant::BiasCorrected), 0.0);
    }

    #[test]
    fn test_perfect_association() {
        let t = ContingencyTable::two_by_two(20, 0, 0, 30);
        assert_eq!(calculate_cramers_v(&t), 1.0);
    }

    #[test]
    fn test_degenerate_zero_marginal() {
        // Everyone enrolled in A: the "not A" row is empty.
        let t = ContingencyTable::two_by_two(5, 10, 0, 0);
        assert!(t.is_degenerate());
        let chi2 = pearson_chi_squared(&t, false);
        assert!(chi2.degenerate);
        assert_eq!(chi2.p_value, 1.0);
        assert_eq!(calculate_cramers_v(&t), 0.0);
        assert_eq!(cramers_v(&t, CramersVariant::BiasCorrected), 0.0);
    }

    #[test]
    fn test_empty_table_is_zero() {
        let t = ContingencyTable::two_by_two(0, 0, 0, 0);
        assert_eq!(calculate_cramers_v(&t), 0.0);
    }

    #[test]
    fn test_single_observation_bias_corrected() {
        let t = ContingencyTable::two_by_two(1, 0, 0, 0);
        assert_eq!(cramers_v(&t, CramersVariant::BiasCorrected), 0.0);
    }

    #[test]
    fn test_rejects_ragged_and_empty() {
        assert!(ContingencyTable::new(vec![]).is_none());
        assert!(ContingencyTable::new(vec![vec![]]).is_none());
        assert!(ContingencyTable::new(vec![vec![1, 2], vec![3]]).is_none());
    }

    #[test]
    fn test_marginals() {
        let t = table(&[&[6, 9], &[8, 5], &[12, 9]]);
        assert_eq!(t.row_totals(), vec![15, 13, 21]);
        assert_eq!(t.col_totals(), vec![26, 23]);
        assert_eq!(t.total(), 49);
        assert_eq!(t.degrees_of_freedom(), 2);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.161_743_595, 4), 0.1617);
        assert_eq!(round_to(0.177_453_037, 4), 0.1775);
        assert_eq!(round_to(0.123_45, 2), 0.12);
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!(CramersVariant::parse("plain"), Some(CramersVariant::Plain));
        assert_eq!(
            CramersVariant::parse("bias_corrected"),
            Some(CramersVariant::BiasCorrected)
        );
        assert_eq!(CramersVariant::parse("nope"), None);
        assert_eq!(CramersVariant::default(), CramersVariant::Plain);
        assert_eq!(CramersVariant::Plain.next(), CramersVariant::BiasCorrected);
    }
}
