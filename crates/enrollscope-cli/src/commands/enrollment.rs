use std::collections::BTreeMap;

use enrollscope_core::{
    Dataset, EnrollmentFilter, enrollment_counts, enrollment_timeline, parse_list,
};

use super::{WindowArgs, truncate};

fn program_filter(
    dataset: &Dataset,
    programs: Option<&str>,
    window: &WindowArgs,
    grades: &str,
) -> EnrollmentFilter {
    let filter = EnrollmentFilter::new(window.years(dataset))
        .with_codes(window.codes(dataset))
        .with_grades(super::parse_grades(grades));
    match programs {
        Some(programs) => filter.with_programs(parse_list(programs)),
        None => filter,
    }
}

pub fn run(
    data: &str,
    programs: Option<&str>,
    window: &WindowArgs,
    grades: &str,
    color: &str,
    output_path: Option<&str>,
) {
    let dataset = super::load_dataset(data);
    let color = super::parse_attribute(color);
    let filter = program_filter(&dataset, programs, window, grades);
    let counts = enrollment_counts(&dataset, &filter, color);

    println!("📊 Total enrollment by program and {}\n", color.label());
    if counts.is_empty() {
        println!("  (no enrollments match)");
    }
    let mut current = "";
    for c in &counts {
        if c.program != current {
            let total: usize = counts
                .iter()
                .filter(|o| o.program == c.program)
                .map(|o| o.count)
                .sum();
            println!("  {:<30} {total:>6}", truncate(&c.program, 30));
            current = &c.program;
        }
        println!("    {:<28} {:>6}", truncate(&c.group, 28), c.count);
    }

    if let Some(path) = output_path {
        super::write_json(&counts, path, "Enrollment counts");
    }
}

pub struct TimelineCommandConfig<'a> {
    pub data: &'a str,
    pub programs: Option<&'a str>,
    pub window: &'a WindowArgs,
    pub grades: &'a str,
    pub facet: &'a str,
    pub color: &'a str,
    pub output_path: Option<&'a str>,
}

pub fn run_timeline(cfg: TimelineCommandConfig) {
    let dataset = super::load_dataset(cfg.data);
    let facet = super::parse_attribute(cfg.facet);
    let color = super::parse_attribute(cfg.color);
    let filter = program_filter(&dataset, cfg.programs, cfg.window, cfg.grades);
    let counts = enrollment_timeline(&dataset, &filter, facet, color);

    println!(
        "📈 Enrollment per year by {} and {}\n",
        facet.label(),
        color.label()
    );
    if counts.is_empty() {
        println!("  (no enrollments match)");
    }

    // facet -> year -> [(group, count)]
    let mut grouped: BTreeMap<&str, BTreeMap<i32, Vec<(&str, usize)>>> = BTreeMap::new();
    for c in &counts {
        grouped
            .entry(c.facet.as_str())
            .or_default()
            .entry(c.year)
            .or_default()
            .push((c.group.as_str(), c.count));
    }
    for (facet_value, years) in &grouped {
        println!("  {facet_value}");
        for (year, groups) in years {
            let parts: Vec<String> = groups.iter().map(|(g, n)| format!("{g}: {n}")).collect();
            let total: usize = groups.iter().map(|(_, n)| n).sum();
            println!("    {year}  {total:>5}   {}", parts.join("  "));
        }
    }

    if let Some(path) = cfg.output_path {
        super::write_json(&counts, path, "Enrollment timeline");
    }
}
