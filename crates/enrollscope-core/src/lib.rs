//! # enrollscope-core
//!
//! **After-school program enrollment analytics.**
//!
//! `enrollscope-core` filters a read-only enrollment log, ranks the most
//! enrolled programs, and measures how strongly students' enrollments in one
//! program go together with another, using Cramer's V over each pair's 2×2
//! co-enrollment table.
//!
//! ## Quick Start
//!
//! ```no_run
//! use enrollscope_core::{AssociationQuery, Dataset, association_matrix};
//!
//! let dataset = Dataset::load("aft_v3.csv").unwrap();
//! let report = association_matrix(&dataset, &AssociationQuery::for_dataset(&dataset));
//! for (label, row) in report.matrix.labels().iter().zip(report.matrix.values()) {
//!     println!("{label}: {row:?}");
//! }
//! ```
//!
//! ## Architecture
//!
//! Filter → Top-N → Co-enrollment index → Pairwise Cramer's V → Matrix
//!
//! - The filter selects enrollments by academic-year window, program codes
//!   and grade band.
//! - The N most frequent full program names (qualifiers + name) are kept.
//! - Each program's student set comes from the *whole* dataset, restricted to
//!   the students seen in the filtered window.
//! - Every unordered pair gets a contingency table and a Cramer's V; the
//!   results fill a symmetric matrix with a unit diagonal.
//!
//! The pipeline is pure: it never mutates the [`Dataset`] and keeps no state
//! between calls.

pub mod association;
pub mod dataset;
pub mod filter;
pub mod index;
pub mod matrix;
pub mod pipeline;
pub mod popularity;
pub mod record;
pub mod top;

pub use association::{PairAssociation, associate, associate_all, associate_at};
pub use dataset::{Catalog, CodeEntry, Dataset, DatasetError, code_label};
pub use filter::{
    AttributePredicate, EnrollmentFilter, FilteredEnrollmentSet, GradeBand, YearRange, filter,
    parse_codes, parse_list, select_where,
};
pub use index::{CoEnrollmentIndex, build_index};
pub use matrix::{AssociationMatrix, HeatmapFigure, annotation};
pub use pipeline::{AssociationQuery, AssociationReport, association_matrix};
pub use popularity::{
    DEFAULT_TREEMAP_DIMENSIONS, EnrollmentCount, TimelineCount, TreemapLeaf, enrollment_counts, enrollment_timeline,
    popularity, treemap,
};
pub use record::{Attribute, Enrollment, EnrollmentRecord};
pub use top::{
    DEFAULT_ASSOCIATION_TOP_N, DEFAULT_POPULARITY_TOP_N, ProgramCount, TopProgramSet,
    restrict_to_top, select_top,
};

pub use enrollscope_stats::{ContingencyTable, CramersVariant};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
