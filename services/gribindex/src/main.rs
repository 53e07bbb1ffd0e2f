//! Command-line lookups over a GRIB layer catalog snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use grib_common::parse_timestamp;
use storage::{Catalog, LayerField, LayerQuery, MemoryCatalog, TimeDirection, TimeFilter};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gribindex")]
#[command(about = "Query an index of GRIB layers")]
struct Args {
    /// Catalog snapshot path
    #[arg(long, env = "GRIBINDEX_CATALOG", default_value = "gribindex.json")]
    catalog: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List layers, or distinct values of one layer attribute
    Lookup(LookupArgs),
    /// Print catalog record counts
    Stats,
}

#[derive(ClapArgs, Debug)]
struct LookupArgs {
    /// What to print
    #[arg(long, value_enum, default_value_t = Output::Layers)]
    output: Output,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Valid time (RFC 3339 or `YYYY-MM-DD[THH:MM:SS]`, UTC)
    #[arg(long)]
    timestamp: Option<String>,

    /// Layers valid at or after the timestamp, nearest first
    #[arg(long, requires = "timestamp")]
    after: bool,

    #[arg(long)]
    parameter: Option<String>,

    #[arg(long)]
    unit: Option<String>,

    #[arg(long)]
    level_type: Option<String>,

    #[arg(long, allow_negative_numbers = true, conflicts_with_all = ["level_highest_below", "level_lowest_above"])]
    level: Option<f64>,

    /// Only the highest level strictly below this one
    #[arg(long, allow_negative_numbers = true, conflicts_with = "level_lowest_above")]
    level_highest_below: Option<f64>,

    /// Only the lowest level strictly above this one
    #[arg(long, allow_negative_numbers = true)]
    level_lowest_above: Option<f64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Output {
    #[default]
    Layers,
    Names,
    Units,
    LevelTypes,
    Levels,
}

impl Output {
    fn field(self) -> Option<LayerField> {
        match self {
            Output::Layers => None,
            Output::Names => Some(LayerField::Name),
            Output::Units => Some(LayerField::Unit),
            Output::LevelTypes => Some(LayerField::LevelType),
            Output::Levels => Some(LayerField::Level),
        }
    }
}

impl LookupArgs {
    fn query(&self) -> Result<LayerQuery> {
        let mut query = LayerQuery::new();

        if let (Some(lon), Some(lat)) = (self.lon, self.lat) {
            query = query.at_point(lon, lat);
        }
        if let Some(ts) = &self.timestamp {
            let timestamp =
                parse_timestamp(ts).with_context(|| format!("Invalid timestamp: {}", ts))?;
            let direction = if self.after {
                TimeDirection::AtOrAfter
            } else {
                TimeDirection::AtOrBefore
            };
            query = query.with_time(Some(TimeFilter {
                timestamp,
                direction,
            }));
        }
        if let Some(name) = &self.parameter {
            query = query.parameter(name);
        }
        if let Some(unit) = &self.unit {
            query = query.unit(unit);
        }
        if let Some(level_type) = &self.level_type {
            query = query.level_type(level_type);
        }
        if let Some(level) = self.level {
            query = query.level(level);
        }
        if let Some(level) = self.level_highest_below {
            query = query.level_highest_below(level);
        }
        if let Some(level) = self.level_lowest_above {
            query = query.level_lowest_above(level);
        }

        Ok(query)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let catalog = MemoryCatalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    info!(catalog = %args.catalog.display(), "Loaded catalog");

    let output = run(&catalog, &args.command)?;
    println!("{}", output);
    Ok(())
}

/// Execute a command and render its JSON output.
fn run(catalog: &MemoryCatalog, command: &Command) -> Result<String> {
    let json = match command {
        Command::Stats => serde_json::to_value(catalog.stats()?)?,
        Command::Lookup(lookup) => {
            let query = lookup.query()?;
            debug!(?query, "Running lookup");
            match lookup.output.field() {
                None => serde_json::to_value(catalog.query_layers(&query)?)?,
                Some(field) => serde_json::to_value(catalog.query_distinct_field(field, &query)?)?,
            }
        }
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
