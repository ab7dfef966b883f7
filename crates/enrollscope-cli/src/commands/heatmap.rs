use enrollscope_core::{
    AssociationQuery, AssociationReport, CramersVariant, PairAssociation, annotation,
    association_matrix,
};

use super::{WindowArgs, truncate};

/// Label column width in the printed matrix.
const LABEL_WIDTH: usize = 26;

pub struct HeatmapCommandConfig<'a> {
    pub data: &'a str,
    pub window: &'a WindowArgs,
    pub grades: &'a str,
    pub top_n: usize,
    pub variant: &'a str,
    pub pairs: usize,
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: HeatmapCommandConfig) {
    let dataset = super::load_dataset(cfg.data);
    let query = AssociationQuery::new(
        cfg.window.years(&dataset),
        cfg.window.codes(&dataset),
        super::parse_grades(cfg.grades),
    )
    .with_top_n(cfg.top_n)
    .with_variant(CramersVariant::parse(cfg.variant).unwrap_or_default());

    let report = association_matrix(&dataset, &query);
    print_summary(&report);

    if report.matrix.is_empty() {
        println!("\n  No enrollments match this filter.");
    } else {
        print_matrix(&report);
    }

    if cfg.pairs > 0 && !report.pairs.is_empty() {
        println!("\n  Strongest pairs:");
        for (i, j, _) in report.matrix.strongest_pairs().into_iter().take(cfg.pairs) {
            let labels = report.matrix.labels();
            if let Some(pair) = report.pair(&labels[i], &labels[j]) {
                print_pair(pair);
            }
        }
    }

    if let Some(path) = cfg.output_path {
        let json = serde_json::json!({
            "report": &report,
            "heatmap": report.heatmap(),
        });
        super::write_json(&json, path, "Heatmap report");
    }
}

fn print_summary(report: &AssociationReport) {
    let q = &report.query;
    let codes: Vec<&str> = q.codes.iter().map(String::as_str).collect();
    println!("🎓 Program association (Cramer's V, {})", q.variant.as_str());
    println!(
        "   Years {}–{}  ·  {}  ·  codes: {}",
        q.years.start(),
        q.years.end(),
        q.grades.label(),
        if codes.is_empty() {
            "(none)".to_string()
        } else {
            codes.join(",")
        }
    );
    println!(
        "   {} enrollments, {} students in window, top {} of {} requested",
        report.filtered_enrollments,
        report.universe_size,
        report.top_programs.len(),
        q.top_n
    );
}

fn print_matrix(report: &AssociationReport) {
    let labels = report.matrix.labels();
    println!();
    print!("  {:>3} {:<LABEL_WIDTH$}", "", "");
    for j in 0..labels.len() {
        print!(" {:>5}", j + 1);
    }
    println!();
    for (i, (label, row)) in labels.iter().zip(report.matrix.values()).enumerate() {
        print!("  {:>3} {:<LABEL_WIDTH$}", i + 1, truncate(label, LABEL_WIDTH));
        for v in row {
            print!(" {:>5}", annotation(*v));
        }
        println!();
    }
}

fn print_pair(pair: &PairAssociation) {
    let t = &pair.table;
    println!();
    println!("  ┌─ {} × {}", pair.program_a, pair.program_b);
    println!(
        "  │ V = {:.4}   χ² = {:.4} (dof {})   p = {:.4}{}",
        pair.cramers_v,
        pair.chi_squared.statistic,
        pair.chi_squared.dof,
        pair.chi_squared.p_value,
        if pair.chi_squared.degenerate {
            "   (degenerate)"
        } else {
            ""
        }
    );
    println!("  │ {:>12} {:>8} {:>8}", "", "in B", "not B");
    println!("  │ {:>12} {:>8} {:>8}", "in A", t.get(0, 0), t.get(0, 1));
    println!("  └ {:>12} {:>8} {:>8}", "not A", t.get(1, 0), t.get(1, 1));
}
