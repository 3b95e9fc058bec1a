//! Command-line driver for the hopbench benchmarks.
#![forbid(unsafe_code)]

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use hopbench::bench::registry::DISPATCH_ENV;
use hopbench::config::parse_override;
use hopbench::logging::init_logging;
use hopbench::{Outcome, Registry, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "hopbench",
    version,
    about = "Insert and traversal micro-benchmarks for a graph record store"
)]
struct Cli {
    #[arg(value_name = "BENCHMARK", help = "Benchmark to run (ring or books)")]
    benchmark: String,

    #[arg(
        value_name = "ARGS",
        help = "Entry point (create or traverse) followed by its positional arguments"
    )]
    args: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        env = "HOPBENCH_CONFIG",
        help = "TOML config file"
    )]
    config: Option<PathBuf>,

    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_set,
        help = "Override one config key; may be repeated"
    )]
    set: Vec<(String, String)>,

    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log filter directive for stderr output"
    )]
    log_level: String,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for reports"
    )]
    format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_set(raw: &str) -> Result<(String, String), String> {
    parse_override(raw).map_err(|err| err.to_string())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let registry = Registry::standard()?;
    let benchmark = registry.benchmark(&cli.benchmark)?;
    let dispatch = std::env::var(DISPATCH_ENV).ok();
    // Keep stdout for the report alone when it has to parse as JSON.
    let mut prompt: Box<dyn Write> = match cli.format {
        OutputFormat::Json => Box::new(io::stderr()),
        OutputFormat::Text => Box::new(io::stdout()),
    };
    let selected = benchmark.select(
        &cli.args,
        dispatch.as_deref(),
        &mut io::stdin().lock(),
        &mut prompt,
    )?;
    let Some((entry, rest)) = selected else {
        return Ok(());
    };

    // Positional arguments beat --set; JSON output never draws progress.
    let mut overrides = cli.set.clone();
    overrides.extend(entry.bind(rest)?);
    if cli.format == OutputFormat::Json {
        overrides.push(("renderProgression".into(), "false".into()));
    }

    let settings = Settings::load(benchmark.name, cli.config.as_deref(), overrides)?;
    let outcome = entry.run(&settings)?;
    emit(cli.format, &outcome)
}

fn emit(format: OutputFormat, outcome: &Outcome) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(outcome)?;
            println!("{json}");
        }
        OutputFormat::Text => println!("{outcome}"),
    }
    Ok(())
}
