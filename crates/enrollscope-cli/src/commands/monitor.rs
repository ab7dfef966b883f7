use enrollscope_core::AssociationQuery;

use super::WindowArgs;

pub fn run(data: &str, window: &WindowArgs, grades: &str, top_n: usize) {
    let dataset = super::load_dataset(data);
    let query = AssociationQuery::new(
        window.years(&dataset),
        window.codes(&dataset),
        super::parse_grades(grades),
    )
    .with_top_n(top_n);
    let mut app = crate::tui::app::App::new(dataset, query);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
