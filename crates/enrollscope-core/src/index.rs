//! Co-enrollment index: which students ever took each top program.
//!
//! Membership is taken from the full, unfiltered dataset so that a student's
//! whole multi-year history in a program counts, not just the selected
//! window. Membership is then restricted to the universe, the students seen
//! in the top-program-filtered window. Every program set is a subset of the
//! universe, which keeps every contingency cell non-negative.

use std::collections::{HashMap, HashSet};

use enrollscope_stats::ContingencyTable;

use crate::dataset::Dataset;
use crate::filter::FilteredEnrollmentSet;
use crate::top::TopProgramSet;

/// Per-program student sets, aligned with the order of a [`TopProgramSet`],
/// plus the universe of students they are counted against.
#[derive(Debug, Clone)]
pub struct CoEnrollmentIndex<'a> {
    programs: Vec<String>,
    positions: HashMap<String, usize>,
    members: Vec<HashSet<&'a str>>,
    universe: HashSet<&'a str>,
}

impl<'a> CoEnrollmentIndex<'a> {
    /// Program labels in selection order.
    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    pub fn position(&self, program: &str) -> Option<usize> {
        self.positions.get(program).copied()
    }

    pub fn members(&self, program: &str) -> Option<&HashSet<&'a str>> {
        self.position(program).map(|i| &self.members[i])
    }

    /// Every student present in the top-program-filtered window.
    pub fn universe(&self) -> &HashSet<&'a str> {
        &self.universe
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// The 2×2 table `[[|A∩B|, |A\B|], [|B\A|, |U|-|A∪B|]]` for the
    /// programs at positions `a` and `b`. Cells always sum to `|U|`.
    pub fn contingency_at(&self, a: usize, b: usize) -> ContingencyTable {
        let (set_a, set_b) = (&self.members[a], &self.members[b]);
        let both = set_a.intersection(set_b).count();
        let a_only = set_a.len() - both;
        let b_only = set_b.len() - both;
        let union = both + a_only + b_only;
        debug_assert!(union <= self.universe.len());
        let neither = self.universe.len() - union;
        ContingencyTable::two_by_two(both as u64, a_only as u64, b_only as u64, neither as u64)
    }

    /// Contingency table for two programs by name.
    pub fn contingency(&self, program_a: &str, program_b: &str) -> Option<ContingencyTable> {
        Some(self.contingency_at(self.position(program_a)?, self.position(program_b)?))
    }
}

/// Build the co-enrollment index for `top_programs`.
///
/// `full_dataset` supplies membership history; `filtered_universe` (the
/// filtered enrollments restricted to the top programs) defines the student
/// universe.
pub fn build_index<'a>(
    full_dataset: &'a Dataset,
    top_programs: &TopProgramSet,
    filtered_universe: &FilteredEnrollmentSet<'a>,
) -> CoEnrollmentIndex<'a> {
    let programs = top_programs.labels();
    let positions: HashMap<String, usize> = programs
        .iter()
        .enumerate()
        .map(|(i, p)| (p.clone(), i))
        .collect();

    let universe: HashSet<&'a str> = filtered_universe.iter().map(|e| e.person_id()).collect();

    let mut members: Vec<HashSet<&'a str>> = vec![HashSet::new(); programs.len()];
    for enrollment in full_dataset {
        let person = enrollment.person_id();
        if let Some(&i) = positions.get(&enrollment.full_name)
            && universe.contains(person)
        {
            members[i].insert(person);
        }
    }

    log::debug!(
        "co-enrollment index: {} programs, universe of {} students",
        programs.len(),
        universe.len()
    );

    CoEnrollmentIndex {
        programs,
        positions,
        members,
        universe,
    }
}
