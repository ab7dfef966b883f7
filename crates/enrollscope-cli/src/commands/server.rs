use std::sync::Arc;

pub fn run(data: &str, host: &str, port: u16) {
    let dataset = Arc::new(super::load_dataset(data));

    let base = format!("http://{host}:{port}");

    println!("🎓 Enrollscope Server v{}", enrollscope_core::VERSION);
    println!("   {base}");
    println!(
        "   {} enrollments, {} students from {data}",
        dataset.len(),
        dataset.student_count()
    );
    println!();
    println!("   Endpoints:");
    println!("     GET /                            API index (try: curl {base})");
    println!("     GET /health                      Dataset health check");
    println!("     GET /api/v1/catalog              Codes, years, programs, grade bands");
    println!("     GET /api/v1/heatmap              Program association matrix");
    println!("     GET /api/v1/popularity           Most enrolled programs");
    println!("     GET /api/v1/treemap              Enrollment by attribute group");
    println!("     GET /api/v1/enrollment           Total enrollment per program");
    println!("     GET /api/v1/enrollment/timeline  Enrollment per academic year");
    println!();
    println!("   Query params:");
    println!("     start=YYYY&end=YYYY      Academic-year window (default: whole dataset)");
    println!("     codes=S,A                Program codes (default: all)");
    println!("     grades=hs|ms|all         Grade band (heatmap default: hs)");
    println!("     top_n=N                  Programs to rank");
    println!("     variant=plain|bias_corrected");
    println!("     by=gender,race  color=fa  programs=Crew,Chorus");
    println!();
    println!("   Examples:");
    println!("     curl '{base}/api/v1/heatmap?codes=S,A&grades=hs'");
    println!("     curl '{base}/api/v1/treemap?by=gender,race'");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(enrollscope_server::run_server(dataset, host, port)) {
        eprintln!("Server error on {host}:{port}: {e}");
        std::process::exit(1);
    }
}
