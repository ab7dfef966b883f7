//! Most-enrolled program selection.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::filter::FilteredEnrollmentSet;

/// Default number of programs compared in the association heatmap.
pub const DEFAULT_ASSOCIATION_TOP_N: usize = 12;
/// Default number of programs in the popularity ranking.
pub const DEFAULT_POPULARITY_TOP_N: usize = 15;

/// A program's full name and how many filtered enrollments it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramCount {
    pub program: String,
    pub count: usize,
}

/// Up to N distinct full program names, most enrolled first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopProgramSet {
    entries: Vec<ProgramCount>,
}

impl TopProgramSet {
    pub fn entries(&self) -> &[ProgramCount] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.program.as_str())
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.program.clone()).collect()
    }

    pub fn position(&self, program: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.program == program)
    }

    pub fn contains(&self, program: &str) -> bool {
        self.position(program).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Count occurrences of each key and order them by descending count.
/// Ties keep the order in which keys were first encountered.
pub(crate) fn rank_by_count<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut ranked: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match slots.get(&key) {
            Some(&slot) => ranked[slot].1 += 1,
            None => {
                slots.insert(key.clone(), ranked.len());
                ranked.push((key, 1));
            }
        }
    }
    // sort_by is stable: equal counts stay in first-seen order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// The `n` most frequent full program names in `records`.
///
/// Returns fewer than `n` entries when fewer distinct names exist, and an
/// empty set for `n == 0`.
pub fn select_top(records: &FilteredEnrollmentSet<'_>, n: usize) -> TopProgramSet {
    let mut ranked = rank_by_count(records.iter().map(|e| e.full_name.as_str()));
    ranked.truncate(n);
    TopProgramSet {
        entries: ranked
            .into_iter()
            .map(|(program, count)| ProgramCount {
                program: program.to_string(),
                count,
            })
            .collect(),
    }
}

/// Keep only enrollments whose full name is in `top`.
pub fn restrict_to_top<'a>(
    records: &FilteredEnrollmentSet<'a>,
    top: &TopProgramSet,
) -> FilteredEnrollmentSet<'a> {
    records.clone().retain(|e| top.contains(&e.full_name))
}
