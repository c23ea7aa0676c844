#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `stadfang`: Icelandic address lookup from the command line.
//!
//! Every subcommand reads the address table from `--table` (a prepared
//! CSV), `--registry` (the raw Staðfangaskrá export, `.dsv`, `.csv` or
//! `.zip`) or the paths in a `--config` TOML file.
//!
//! Logging goes through `indicatif-log-bridge` (see [`logging`]) so that
//! log lines and the table-loading spinner never interleave. Set
//! `RUST_LOG=debug` for per-batch statistics.

mod logging;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indicatif::MultiProgress;
use stadfang_geocoder::{Geocoder, hydrate::HydrateOptions};
use stadfang_registry::RegistryConfig;

#[derive(Parser)]
#[command(name = "stadfang", about = "Icelandic address lookup and geocoding")]
struct Cli {
    /// TOML config file with table paths and extra aliases
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Prepared canonical address table (CSV)
    #[arg(long, global = true)]
    table: Option<PathBuf>,
    /// Raw registry export (`.dsv`, `.csv` or `.zip`)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up coordinates for a postcode, street and house number
    Lookup {
        /// Postcode (e.g. 101)
        postcode: String,
        /// Street name in either grammatical case
        street: Option<String>,
        /// House number, with letter if any (e.g. 5a)
        house_nr: Option<String>,
    },
    /// Find addresses in free text and print them as JSON lines
    Scan {
        /// Text to scan; multiple words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Resolve addresses against the table and print a JSON array
    Resolve {
        /// One address per argument (e.g. "Laugavegur 22, 101 Reykjavík")
        #[arg(required = true)]
        addresses: Vec<String>,
        /// Treat the arguments as one block of text and resolve every
        /// address found in it
        #[arg(long)]
        body: bool,
    },
    /// Add resolved address columns to a CSV file
    Hydrate {
        /// Input CSV
        #[arg(long)]
        input: PathBuf,
        /// Output CSV (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Free-text address column
        #[arg(long, default_value = "address")]
        column: String,
        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },
    /// Convert a raw registry export into a canonical table CSV
    Import {
        /// Output CSV
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = logging::init_logger();
    let cli = Cli::parse();
    let config = registry_config(&cli)?;

    match cli.command {
        Commands::Lookup {
            postcode,
            street,
            house_nr,
        } => {
            let geocoder = load_geocoder(&multi, &config)?;
            match geocoder.single_lookup(&postcode, street.as_deref(), house_nr.as_deref()) {
                Some(c) => println!("{:.6}, {:.6}", c.lat, c.lon),
                None => println!("not found"),
            }
        }
        Commands::Scan { text } => {
            let geocoder = load_geocoder(&multi, &config)?;
            let text = text.join(" ");
            let mut stdout = std::io::stdout().lock();
            for m in geocoder.scan_text(&text) {
                serde_json::to_writer(&mut stdout, &m)?;
                writeln!(stdout)?;
            }
        }
        Commands::Resolve { addresses, body } => {
            let geocoder = load_geocoder(&multi, &config)?;
            let resolved = if body {
                geocoder.query_text_body(&addresses.join(" "))
            } else {
                geocoder.resolve_text(&addresses)
            };
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Hydrate {
            input,
            output,
            column,
            delimiter,
        } => {
            let geocoder = load_geocoder(&multi, &config)?;
            let options = HydrateOptions {
                column,
                delimiter: stadfang_registry::delimiter_byte(delimiter)?,
            };
            let reader = BufReader::new(File::open(&input)?);
            let writer: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(std::io::stdout().lock()),
            };
            let summary = geocoder.hydrate_csv(reader, writer, &options)?;
            log::info!(
                "{}: {} of {} rows resolved",
                input.display(),
                summary.resolved,
                summary.rows
            );
        }
        Commands::Import { output } => {
            if config.registry_path.is_empty() {
                return Err("import needs --registry or registry_path in the config".into());
            }
            let spinner = logging::spinner(&multi, "Parsing registry export...");
            let table =
                stadfang_registry::source::parse_registry(Path::new(&config.registry_path))?;
            spinner.finish_and_clear();

            let writer = BufWriter::new(File::create(&output)?);
            stadfang_registry::source::write_table(&table, writer)?;
            log::info!("Wrote {} addresses to {}", table.len(), output.display());
        }
    }

    Ok(())
}

/// Builds the registry config from `--config`, then applies `--table`
/// and `--registry` on top.
fn registry_config(cli: &Cli) -> Result<RegistryConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => stadfang_registry::load_config(path)?,
        None => RegistryConfig::default(),
    };

    if let Some(registry) = &cli.registry {
        config.registry_path = registry.display().to_string();
        if cli.table.is_none() {
            config.table_path.clear();
        }
    }
    if let Some(table) = &cli.table {
        config.table_path = table.display().to_string();
    }

    Ok(config)
}

fn load_geocoder(
    multi: &MultiProgress,
    config: &RegistryConfig,
) -> Result<Geocoder, Box<dyn std::error::Error>> {
    let spinner = logging::spinner(multi, "Loading address table...");
    let geocoder = Geocoder::from_config(config)?;
    spinner.finish_and_clear();
    log::info!("Loaded {} addresses", geocoder.table().len());
    Ok(geocoder)
}
