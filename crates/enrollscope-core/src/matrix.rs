//! Dense symmetric association matrix and its heatmap figure.

use std::collections::HashMap;

use serde::Serialize;

use enrollscope_stats::round_to;

use crate::association::PairAssociation;

/// Square, symmetric, label-indexed matrix of Cramer's V values.
///
/// The diagonal is exactly 1.0 and every off-diagonal cell lies in `[0, 1]`,
/// rounded to 4 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssociationMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl AssociationMatrix {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (0..n).all(|j| self.values[i][j] == self.values[j][i]))
    }

    /// Off-diagonal cells `(i, j, value)` with `i < j`, strongest first.
    pub fn strongest_pairs(&self) -> Vec<(usize, usize, f64)> {
        let n = self.len();
        let mut pairs: Vec<(usize, usize, f64)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, self.values[i][j]))
            .collect();
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
        pairs
    }
}

/// Assemble pairwise results into a matrix ordered by `top_programs`.
///
/// Pairs naming a program outside `top_programs` are ignored. A cell left
/// unpopulated after all pairs are written is filled with 0.0 and logged.
pub fn build(top_programs: &[String], pairwise: &[PairAssociation]) -> AssociationMatrix {
    let n = top_programs.len();
    let positions: HashMap<&str, usize> = top_programs
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();

    let mut grid: Vec<Vec<Option<f64>>> = vec![vec![None; n]; n];
    for (i, row) in grid.iter_mut().enumerate() {
        row[i] = Some(1.0);
    }

    for pair in pairwise {
        let (Some(&i), Some(&j)) = (
            positions.get(pair.program_a.as_str()),
            positions.get(pair.program_b.as_str()),
        ) else {
            log::warn!(
                "ignoring association for unknown pair ({}, {})",
                pair.program_a,
                pair.program_b
            );
            continue;
        };
        if i == j {
            continue;
        }
        let value = if pair.cramers_v.is_finite() {
            round_to(pair.cramers_v.clamp(0.0, 1.0), 4)
        } else {
            0.0
        };
        grid[i][j] = Some(value);
        grid[j][i] = Some(value);
    }

    let missing = grid.iter().flatten().filter(|cell| cell.is_none()).count();
    if missing > 0 {
        log::warn!("{missing} association cells were never computed, filled with 0.0");
    }

    AssociationMatrix {
        labels: top_programs.to_vec(),
        values: grid
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.unwrap_or(0.0)).collect())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Heatmap figure
// ---------------------------------------------------------------------------

/// Colour scale bounds used by the heatmap renderer.
pub const HEATMAP_COLOR_RANGE: [f64; 2] = [0.0, 0.3];
pub const HEATMAP_COLOR_MIDPOINT: f64 = 0.15;

/// Everything a heatmap renderer needs: identical axis labels, the numeric
/// grid, and per-cell text rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapFigure {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<f64>>,
    pub text: Vec<Vec<String>>,
    pub color_label: &'static str,
    pub color_range: [f64; 2],
    pub color_midpoint: f64,
}

impl HeatmapFigure {
    pub fn from_matrix(matrix: &AssociationMatrix) -> Self {
        Self {
            x: matrix.labels.clone(),
            y: matrix.labels.clone(),
            z: matrix.values.clone(),
            text: matrix
                .values
                .iter()
                .map(|row| row.iter().map(|v| annotation(*v)).collect())
                .collect(),
            color_label: "Correlation",
            color_range: HEATMAP_COLOR_RANGE,
            color_midpoint: HEATMAP_COLOR_MIDPOINT,
        }
    }
}

/// Cell annotation text: the value rounded to 2 decimals.
pub fn annotation(value: f64) -> String {
    format!("{:.2}", round_to(value, 2))
}
