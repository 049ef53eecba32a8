use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::info;
use std::path::PathBuf;

mod cli;
mod config;
mod load;
mod orders;
mod report;

#[derive(Parser)]
#[command(name = "bulkload")]
#[command(about = "Convert CSV rows into an SSTable bulk-load data file")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Input CSV file (the first line is a header and is skipped)
    input: Option<PathBuf>,

    /// Output directory; keyspace and table subdirectories are created inside
    #[arg(default_value = "./data")]
    output_dir: PathBuf,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress output)
    #[arg(short, long)]
    quiet: bool,

    /// What to do with a timestamp no configured format can parse
    #[arg(long, value_enum, default_value = "substitute-now")]
    on_bad_timestamp: cli::TimestampPolicyArg,

    /// Field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Running with no arguments prints usage and exits cleanly
    let Some(input) = cli.input else {
        Cli::command().print_help()?;
        return Ok(());
    };

    info!("Starting bulkload v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("on-bad-timestamp policy: {}", cli.on_bad_timestamp);

    let config = config::LoadConfig::new(
        input,
        cli.output_dir,
        cli.on_bad_timestamp.into(),
        cli.delimiter,
    )?;

    let report = load::run(&config)?;
    report.print(cli.quiet);
    Ok(())
}
