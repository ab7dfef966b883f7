use enrollscope_core::{AttributePredicate, Enrollment, select_where};

use super::truncate;

pub fn run(data: &str, predicates: &[String], limit: usize, output_path: Option<&str>) {
    let dataset = super::load_dataset(data);
    let mut parsed = Vec::with_capacity(predicates.len());
    for p in predicates {
        match AttributePredicate::parse(p) {
            Some(predicate) => parsed.push(predicate),
            None => {
                eprintln!("Invalid predicate '{p}'. Expected attribute=value, e.g. gender=F");
                std::process::exit(2);
            }
        }
    }

    let matches = select_where(&dataset, &parsed);
    println!(
        "🔎 {} of {} enrollments match ({} students)\n",
        matches.len(),
        dataset.len(),
        matches
            .iter()
            .map(Enrollment::person_id)
            .collect::<std::collections::HashSet<_>>()
            .len()
    );

    println!(
        "  {:<10} {:>6} {:>5} {:<4} {:<32} {:<7} {:<18} {:<3}",
        "Person", "Year", "Grade", "Code", "Program", "Gender", "Race/ethnicity", "FA"
    );
    println!("  {}", "-".repeat(94));
    let shown = if limit == 0 { matches.len() } else { limit };
    for e in matches.iter().take(shown) {
        let r = &e.record;
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "—".to_string());
        println!(
            "  {:<10} {:>6} {:>5} {:<4} {:<32} {:<7} {:<18} {:<3}",
            truncate(&r.person_id, 10),
            r.academic_year,
            r.grade,
            r.program_code,
            truncate(&e.full_name, 32),
            opt(&r.gender),
            truncate(&opt(&r.race_ethnicity), 18),
            opt(&r.financial_aid),
        );
    }
    if matches.len() > shown {
        println!("  … {} more (use --limit 0 to show all)", matches.len() - shown);
    }

    if let Some(path) = output_path {
        let rows: Vec<&Enrollment> = matches.iter().collect();
        super::write_json(&rows, path, "Matching enrollments");
    }
}
