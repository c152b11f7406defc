use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ena_fasta::app::App;
use ena_fasta::config::ConfigLoader;
use ena_fasta::ena::EnaHttpClient;
use ena_fasta::output::{ConsoleOutput, JsonOutput};

/// Download WGS assembly FASTA files listed in an ENA XML search report.
///
/// A spreadsheet index (summary.xlsx) of every selected record is written to
/// the output directory before any download starts.
#[derive(Parser)]
#[command(name = "ena-fasta")]
#[command(version, author)]
struct Cli {
    /// ENA XML search report
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving the index and the FASTA files
    #[arg(short, long)]
    output: Utf8PathBuf,

    /// Keep only records whose organism name starts with this prefix
    #[arg(long, value_name = "PREFIX")]
    organism: Option<String>,

    /// JSON settings file
    #[arg(long)]
    config: Option<String>,

    /// Print the run result as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = ConfigLoader::resolve(cli.config.as_deref())
        .into_diagnostic()?
        .with_organism_prefix(cli.organism);

    let client = EnaHttpClient::new(settings.timeout).into_diagnostic()?;
    let app = App::new(client, settings, cli.output);
    if cli.json {
        let result = app.run(&cli.input, &JsonOutput).into_diagnostic()?;
        JsonOutput::print_run(&result).into_diagnostic()?;
    } else {
        let result = app.run(&cli.input, &ConsoleOutput).into_diagnostic()?;
        ConsoleOutput::print_summary(&result).into_diagnostic()?;
    }
    Ok(())
}
