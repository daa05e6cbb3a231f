mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cli_utils::{DatabaseArgs, FieldSelector};
use commands::{cmd_batch, cmd_inspect, cmd_query};

#[derive(Parser)]
#[command(name = "ipdb-field")]
#[command(
    about = "Look up geolocation fields in IPDB databases",
    long_about = "ipdb-field - Geolocation field lookups for IPDB databases\n\n\
    Resolves IPv4 and IPv6 addresses against an IPDB file and prints fields of the\n\
    selected language block (country, region, city, ...).\n\n\
    The database and language can come from a JSON configuration file\n\
    ({\"database\": \"city.ipdb\", \"language\": \"CN\"}) or from flags.\n\n\
    Examples:\n\
      ipdb-field query -d city.ipdb 36.102.4.81\n\
      ipdb-field query -d city.ipdb -l CN -f city_name 36.102.4.81\n\
      ipdb-field --config geo.json batch clients.txt.gz --format csv\n\
      ipdb-field inspect -d city.ipdb --json"
)]
#[command(version)]
struct Cli {
    /// JSON configuration file naming the database and language
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one address
    Query {
        /// IPv4 or IPv6 address
        #[arg(value_name = "IP")]
        ip: String,

        #[command(flatten)]
        db: DatabaseArgs,

        /// Field name (city_name, ...) or zero-based index; all fields when omitted
        #[arg(short, long)]
        field: Option<FieldSelector>,

        /// Print a JSON object instead of plain text
        #[arg(long)]
        json: bool,

        /// Quiet mode: no output, exit code 0 if found, 1 if not
        #[arg(short, long)]
        quiet: bool,
    },

    /// Look up every address listed in one or more files
    Batch {
        /// Address lists (one per line, .gz supported), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        db: DatabaseArgs,

        /// Field name or zero-based index; all fields when omitted
        #[arg(short, long)]
        field: Option<FieldSelector>,

        /// Output format: csv (default) or json (NDJSON)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Number of worker threads (default: 1, use "auto" for all cores)
        #[arg(short = 'j', long)]
        threads: Option<String>,
    },

    /// Show database metadata
    Inspect {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = ipdb_field::logging::init_logging(cli.verbose) {
        eprintln!("warning: logging disabled: {}", err);
    }

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Query {
            ip,
            db,
            field,
            json,
            quiet,
        } => cmd_query(config, db, ip, field, json, quiet),
        Commands::Batch {
            inputs,
            db,
            field,
            format,
            threads,
        } => cmd_batch(config, db, inputs, field, format, threads),
        Commands::Inspect { db, json } => cmd_inspect(config, db, json),
    }
}
