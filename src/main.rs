use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use borefield::config::{Domain, SizingConfig};
use borefield::search::{
    GheOracle, LayoutBracketSearch, MemoizedOracle, NestedDomainSearch, SearchOutcome,
};
use borefield::sim::ghe::SimulationMethod;
use borefield::sim::line_source::LineSourceGFunction;
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Hybrid,
    Hourly,
}

impl From<Method> for SimulationMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Hybrid => SimulationMethod::Hybrid,
            Method::Hourly => SimulationMethod::Hourly,
        }
    }
}

#[derive(Parser)]
#[command(name = "borefield")]
#[command(about = "Sizes a vertical ground heat exchanger borefield.")]
struct Cli {
    /// Sizing problem as JSON
    config: PathBuf,
    /// Overrides the simulation method of the config
    #[arg(long, value_enum)]
    method: Option<Method>,
    /// Print the full search result as JSON
    #[arg(long)]
    json: bool,
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Selected(selection) => {
            if let Some(level) = selection.level {
                println!("Level: {level}");
            }
            println!("Layout index: {}", selection.layout_index);
            println!("Boreholes: {}", selection.boreholes());
            match selection.layout.spacing() {
                Some(spacing) => println!("Spacing: {spacing:.2} m"),
                None => println!("Spacing: - (single borehole)"),
            }
            println!("Height: {:.2} m", selection.height);
            println!("Excess temperature: {:.3} K", selection.excess);
            println!("Total drilling length: {:.1} m", selection.total_drilling_length);
        }
        SearchOutcome::Infeasible {
            smallest_excess,
            largest_excess,
        } => {
            println!("No feasible design within the height bounds");
            println!("Excess of the smallest candidate: {smallest_excess:.3} K");
            println!("Excess of the largest candidate: {largest_excess:.3} K");
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SizingConfig::from_json_file(&cli.config)?;
    let method = cli.method.map(SimulationMethod::from).unwrap_or(config.method);
    let context = config.context();
    let loads = config.load_profile()?;
    let bounds = config.bounds;
    let oracle = MemoizedOracle::new(
        GheOracle::new(
            LineSourceGFunction::new(),
            config.simulator(),
            &context,
            &bounds,
            &loads,
        )
        .with_method(method),
    );
    let search = LayoutBracketSearch::new(config.bisection);

    let start = Instant::now();
    match config.domain()? {
        Domain::Single(domain) => {
            let result = search.select(&oracle, &domain, &bounds)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            print_outcome(&result.outcome);
            println!("Evaluated layouts: {:?}", result.evaluated_indices());
        }
        Domain::Nested(nested) => {
            let result = NestedDomainSearch::new(search).select(&oracle, &nested, &bounds)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            print_outcome(&result.outcome);
            let outer: Vec<usize> = result.outer_evaluated.keys().copied().collect();
            println!("Evaluated outer candidates: {outer:?}");
            for (level, inner) in &result.levels {
                println!(
                    "Evaluated layouts of level {level}: {:?}",
                    inner.evaluated_indices()
                );
            }
        }
    }
    println!(
        "Simulations: {} ({} answered from cache)",
        oracle.inner().history().len(),
        oracle.hits()
    );
    println!("Elapsed: {:.2?}", start.elapsed());
    Ok(())
}
