use enrollscope_core::{EnrollmentFilter, popularity};

use super::{WindowArgs, truncate};

pub fn run(
    data: &str,
    window: &WindowArgs,
    grades: &str,
    top_n: usize,
    output_path: Option<&str>,
) {
    let dataset = super::load_dataset(data);
    let years = window.years(&dataset);
    let grades = super::parse_grades(grades);
    let filter = EnrollmentFilter::new(years)
        .with_codes(window.codes(&dataset))
        .with_grades(grades);

    let programs = popularity(&dataset, &filter, top_n);

    println!(
        "🏆 Most popular programs, {}–{} ({})\n",
        years.start(),
        years.end(),
        grades.label()
    );
    if programs.is_empty() {
        println!("  (no enrollments match)");
    }
    let max = programs.first().map_or(1, |p| p.count.max(1));
    for (rank, entry) in programs.iter().enumerate() {
        let bar = "█".repeat((entry.count * 30).div_ceil(max));
        println!(
            "  {:>2}. {:<30} {:>6}  {bar}",
            rank + 1,
            truncate(&entry.program, 30),
            entry.count
        );
    }

    if let Some(path) = output_path {
        super::write_json(&programs, path, "Popularity ranking");
    }
}
