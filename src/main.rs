use clap::Parser;
use miette::{IntoDiagnostic, Result};
use opay::domain::order_id::TimeZoneConfig;
use opay::{OpayError, OrderIdGenerator, TimeZone};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Generate order ids", long_about = None)]
struct Cli {
    /// JSON file with `name` and `hour_offset` for the time zone
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time zone name, overrides the config file
    #[arg(long)]
    tz_name: Option<String>,

    /// Hours east of UTC, overrides the config file
    #[arg(long, allow_hyphen_values = true)]
    tz_offset: Option<i32>,

    /// Number of ids to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Print each id as a JSON object with its parts
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let file = File::open(path).map_err(OpayError::from)?;
            serde_json::from_reader::<_, TimeZoneConfig>(file).map_err(OpayError::from)?
        }
        None => TimeZoneConfig::default(),
    };
    if let Some(name) = cli.tz_name {
        config.name = name;
    }
    if let Some(hours) = cli.tz_offset {
        config.hour_offset = hours;
    }

    let time_zone = TimeZone::try_from(config)?;
    tracing::info!(
        time_zone = time_zone.name(),
        count = cli.count,
        "generating order ids"
    );
    let generator = OrderIdGenerator::new().with_time_zone(time_zone);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..cli.count {
        let id = generator.next_order_id();
        if cli.json {
            let line = serde_json::json!({
                "id": id.as_str(),
                "timestamp": id.timestamp().format("%Y-%m-%dT%H:%M:%S").to_string(),
                "nanos": id.nanos(),
                "salt": id.salt(),
            });
            writeln!(out, "{line}").into_diagnostic()?;
        } else {
            writeln!(out, "{id}").into_diagnostic()?;
        }
    }
    out.flush().into_diagnostic()?;

    Ok(())
}
