use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docid::{commands, diagnostics};
use tracing_subscriber::EnvFilter;

/// Command-line interface.
#[derive(Parser)]
#[command(name = "docid", about = "Parse, resolve, and encode documentation comment IDs")]
struct Cli {
    /// Catalog file, overriding `catalog` in `.docid.toml`.
    #[arg(global = true, long)]
    catalog: Option<PathBuf>,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan documentation sources and verify every cref resolves
    Check,
    /// Print the canonical ID of every type and member in the catalog
    Ids {
        /// Output a JSON array
        #[arg(long)]
        json: bool,
    },
    /// List a type's members, inherited ones included, with hidden members
    Members {
        /// Type reference, e.g. `Demo.Widget` or `T:Demo.Box`1`
        #[arg(value_name = "TYPE")]
        type_name: String,
    },
    /// Parse a reference or ID and print its syntax tree
    Parse {
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Reference text, e.g. `Widget.Resize(System.Int32,System.Int32)`
        reference: String,
    },
    /// Resolve a reference against the catalog and print its canonical ID
    Resolve {
        /// Reference text
        reference: String,
    },
}

/// Install the stderr subscriber; `DOCID_LOG` holds the filter, default `warn`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("DOCID_LOG").unwrap_or_else(|_err| return EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    return;
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let catalog = cli.catalog.as_deref();

    let result = match cli.command {
        Commands::Check => commands::check(catalog),
        Commands::Ids { json } => commands::ids(catalog, json).map(|()| return ExitCode::SUCCESS),
        Commands::Members { type_name } => commands::members(catalog, &type_name).map(|()| return ExitCode::SUCCESS),
        Commands::Parse { json, reference } => commands::parse(&reference, json).map(|()| return ExitCode::SUCCESS),
        Commands::Resolve { reference } => commands::resolve(catalog, &reference).map(|()| return ExitCode::SUCCESS),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
