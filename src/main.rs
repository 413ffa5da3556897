use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Apply JSON job files to a Netspoc policy repository.
#[derive(Debug, Parser)]
#[command(name = "netspoc-worker", version)]
struct Cli {
    /// Root directory of the policy files.
    #[arg(long, default_value = "netspoc")]
    root: PathBuf,

    /// Apply the jobs in memory and list the files that would change.
    #[arg(long)]
    dry_run: bool,

    /// Job files, applied in the given order.
    #[arg(required = true)]
    jobs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Library errors already carry file and job context.
    let changed = netspoc_edit::run(&cli.root, &cli.jobs, cli.dry_run)?;
    if cli.dry_run {
        for path in changed {
            println!("{}", path.display());
        }
    }
    Ok(())
}
