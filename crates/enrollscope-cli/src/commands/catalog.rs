pub fn run(data: &str, output_path: Option<&str>) {
    let dataset = super::load_dataset(data);
    let catalog = dataset.catalog();

    println!(
        "📚 {data}: {} enrollments, {} students\n",
        catalog.enrollments, catalog.students
    );

    match (catalog.years.first(), catalog.years.last()) {
        (Some(first), Some(last)) => println!("  Academic years: {first}–{last}"),
        _ => println!("  Academic years: (none)"),
    }

    println!("\n  Program codes:");
    for entry in &catalog.codes {
        println!("    {:<4} {}", entry.code, entry.label);
    }

    println!("\n  Grade bands:");
    for band in &catalog.grade_bands {
        println!("    {:<4} {}", band.key, band.label);
    }

    println!("\n  Programs ({}):", catalog.programs.len());
    for name in &catalog.programs {
        println!("    {name}");
    }

    if let Some(path) = output_path {
        super::write_json(&catalog, path, "Catalog");
    }
}
