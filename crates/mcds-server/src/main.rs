//! MaxCompute data source backend CLI
//!
//! Exercises the driver without a host:
//!
//! ```bash
//! # Expand the time macros of a query
//! mcds-server interpolate --from 2024-01-01T00:00:00Z --to 2024-01-02T00:00:00Z \
//!     'select $__timeGroup(ts, hour), count(*) from t where $__timeFilter(ts) group by 1'
//!
//! # List the column types the driver understands
//! mcds-server types
//!
//! # Validate data source settings
//! MAXCOMPUTE_ACCESS_KEY_SECRET=... mcds-server check-settings '{"endpoint": "...", ...}'
//!
//! # Build a frame from rows dumped as JSON
//! mcds-server frame rows.json --row-limit 100
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use mcds_frame::MemoryRows;
use mcds_server::{logging, Config, InstanceSettings, MaxComputeDriver};
use mcds_types::TimeRange;
use tracing::info;

#[derive(Parser)]
#[command(name = "mcds-server")]
#[command(about = "MaxCompute data source backend")]
struct Cli {
    /// Path to the YAML config file (defaults apply when missing)
    #[arg(long, short, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand $__ macros in a SQL query
    Interpolate {
        /// Start of the time range (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,

        /// End of the time range (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,

        sql: String,
    },

    /// List the registered column type converters
    Types,

    /// Validate data source settings given as JSON
    CheckSettings {
        json: String,

        /// Decrypted secure settings as a JSON object of strings
        #[arg(long)]
        secure: Option<String>,

        #[arg(long, env = "MAXCOMPUTE_ACCESS_KEY_SECRET", hide_env_values = true)]
        access_key_secret: Option<String>,
    },

    /// Build a frame from a JSON dump of columns and rows
    Frame {
        file: PathBuf,

        /// Overrides the configured row limit
        #[arg(long)]
        row_limit: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_logging_env();
    logging::init();
    info!(config = %cli.config.display(), "configuration loaded");

    if let Commands::Frame {
        row_limit: Some(limit),
        ..
    } = &cli.command
    {
        config.query.row_limit = *limit;
    }
    let driver = MaxComputeDriver::new(config.query.clone());

    match cli.command {
        Commands::Interpolate { from, to, sql } => {
            let expanded = driver.interpolate(&sql, &TimeRange::new(from, to))?;
            println!("{}", expanded);
        }
        Commands::Types => {
            for converter in driver.converters() {
                let pattern = converter
                    .input_type_pattern
                    .as_ref()
                    .map(|p| p.as_str())
                    .unwrap_or("");
                let field_type = converter
                    .field_type
                    .map(|t| t.as_str())
                    .unwrap_or("-");
                println!("{:<20} {:<12} {}", converter.name, pattern, field_type);
            }
        }
        Commands::CheckSettings {
            json,
            secure,
            access_key_secret,
        } => {
            let mut instance = InstanceSettings::new(json);
            if let Some(secure) = secure {
                instance.decrypted_secure_json_data =
                    serde_json::from_str::<HashMap<String, String>>(&secure)?;
            }
            if let Some(secret) = access_key_secret {
                instance
                    .decrypted_secure_json_data
                    .entry("accessKeySecret".to_string())
                    .or_insert(secret);
            }

            let settings = driver.connection_settings(&instance)?;
            let driver_settings = driver.settings(&instance);
            println!("{:#?}", settings);
            println!("{:#?}", driver_settings);
        }
        Commands::Frame { file, .. } => {
            let contents = std::fs::read_to_string(&file)?;
            let mut rows: MemoryRows = serde_json::from_str(&contents)?;
            let frame = driver.frame(&mut rows)?;
            println!("{}", serde_json::to_string_pretty(&frame)?);
        }
    }

    Ok(())
}
