//! CLI for enrollscope: after-school program enrollment analytics in your terminal.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

use commands::WindowArgs;

#[derive(Parser)]
#[command(name = "enrollscope")]
#[command(about = "enrollscope: after-school program enrollment analytics in your terminal")]
#[command(version = enrollscope_core::VERSION)]
struct Cli {
    /// Enrollment CSV export
    #[arg(long, global = true, default_value = "aft_v3.csv")]
    data: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Program association heatmap: Cramer's V between the most enrolled programs
    Heatmap {
        #[command(flatten)]
        window: WindowArgs,

        /// Grade band: hs (default), ms, all
        #[arg(long, default_value = "hs")]
        grades: String,

        /// Number of programs in the matrix
        #[arg(long, default_value = "12")]
        top_n: usize,

        /// Cramer's V formulation
        #[arg(long, default_value = "plain", value_parser = ["plain", "bias_corrected"])]
        variant: String,

        /// Print the strongest pairs with their contingency tables
        #[arg(long, default_value = "0")]
        pairs: usize,

        /// Write the full report (matrix, heatmap figure, pairs) as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Most enrolled programs, counted per enrollment record
    Top {
        #[command(flatten)]
        window: WindowArgs,

        /// Grade band: hs, ms, all (default)
        #[arg(long, default_value = "all")]
        grades: String,

        /// Number of programs to list
        #[arg(long, default_value = "15")]
        top_n: usize,

        /// Write results as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Enrollment totals grouped by demographic attributes, then program
    Treemap {
        #[command(flatten)]
        window: WindowArgs,

        /// Comma-separated grouping attributes (gender, race, fa, grade, level, code, year)
        #[arg(long, default_value = "race,gender")]
        by: String,

        /// Write results as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Total enrollment per program, split by an attribute
    Enrollment {
        /// Comma-separated base program names (default: every program)
        #[arg(long)]
        programs: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Grade band: hs, ms, all (default)
        #[arg(long, default_value = "all")]
        grades: String,

        /// Attribute used to split each program's total
        #[arg(long, default_value = "gender")]
        color: String,

        /// Write results as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Enrollment per academic year, faceted and split by attributes
    Timeline {
        /// Comma-separated base program names (default: every program)
        #[arg(long)]
        programs: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Grade band: hs, ms, all (default)
        #[arg(long, default_value = "all")]
        grades: String,

        /// Facet attribute
        #[arg(long, default_value = "program")]
        by: String,

        /// Attribute used to split each year's total
        #[arg(long, default_value = "gender")]
        color: String,

        /// Write results as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Select enrollments matching attribute=value predicates (all must match)
    Filter {
        /// Predicates such as gender=F code=S grade=10
        predicates: Vec<String>,

        /// Maximum rows to print (0 = all)
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Write every matching enrollment as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Program codes, academic years, program names and grade bands in the data
    Catalog {
        /// Write the catalog as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Start the HTTP dashboard API
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8050")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Live interactive association heatmap (TUI)
    Monitor {
        #[command(flatten)]
        window: WindowArgs,

        /// Grade band: hs (default), ms, all
        #[arg(long, default_value = "hs")]
        grades: String,

        /// Number of programs in the matrix
        #[arg(long, default_value = "12")]
        top_n: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let data = cli.data.as_str();

    match cli.command {
        Commands::Heatmap {
            window,
            grades,
            top_n,
            variant,
            pairs,
            output,
        } => commands::heatmap::run(commands::heatmap::HeatmapCommandConfig {
            data,
            window: &window,
            grades: &grades,
            top_n,
            variant: &variant,
            pairs,
            output_path: output.as_deref(),
        }),
        Commands::Top {
            window,
            grades,
            top_n,
            output,
        } => commands::top::run(data, &window, &grades, top_n, output.as_deref()),
        Commands::Treemap { window, by, output } => {
            commands::treemap::run(data, &window, &by, output.as_deref())
        }
        Commands::Enrollment {
            programs,
            window,
            grades,
            color,
            output,
        } => commands::enrollment::run(
            data,
            programs.as_deref(),
            &window,
            &grades,
            &color,
            output.as_deref(),
        ),
        Commands::Timeline {
            programs,
            window,
            grades,
            by,
            color,
            output,
        } => commands::enrollment::run_timeline(commands::enrollment::TimelineCommandConfig {
            data,
            programs: programs.as_deref(),
            window: &window,
            grades: &grades,
            facet: &by,
            color: &color,
            output_path: output.as_deref(),
        }),
        Commands::Filter {
            predicates,
            limit,
            output,
        } => commands::filter::run(data, &predicates, limit, output.as_deref()),
        Commands::Catalog { output } => commands::catalog::run(data, output.as_deref()),
        Commands::Server { port, host } => commands::server::run(data, &host, port),
        Commands::Monitor {
            window,
            grades,
            top_n,
        } => commands::monitor::run(data, &window, &grades, top_n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treemap_groups_by_race_then_gender_by_default() {
        let cli = Cli::try_parse_from(["enrollscope", "treemap"]).unwrap();
        match cli.command {
            Commands::Treemap { by, .. } => assert_eq!(by, "race,gender"),
            _ => panic!("expected the treemap command"),
        }
    }
}
