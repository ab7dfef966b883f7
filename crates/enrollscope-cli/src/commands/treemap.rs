use enrollscope_core::{Attribute, parse_list, treemap};

use super::WindowArgs;

pub fn run(data: &str, window: &WindowArgs, by: &str, output_path: Option<&str>) {
    let dataset = super::load_dataset(data);
    let dimensions: Vec<Attribute> = parse_list(by)
        .iter()
        .map(|key| super::parse_attribute(key))
        .collect();
    let years = window.years(&dataset);
    let leaves = treemap(&dataset, years, &window.codes(&dataset), &dimensions);

    let header: Vec<&str> = dimensions.iter().map(|d| d.label()).collect();
    println!(
        "🌳 Enrollment by {} and program, {}–{}\n",
        header.join(" / "),
        years.start(),
        years.end()
    );
    if leaves.is_empty() {
        println!("  (no enrollments match)");
    }
    for leaf in &leaves {
        println!("  {:>6}  {}", leaf.total, leaf.path.join(" › "));
    }

    if let Some(path) = output_path {
        super::write_json(&leaves, path, "Treemap");
    }
}
