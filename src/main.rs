use clap::Parser;
use keytally::app;
use keytally::core::config::{self, CliOverrides, KeytallyConfig};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keytally", about = "Counts key presses and keeps the tally on disk")]
struct Args {
    /// Tally file to load and save (default: key_counts.json)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Seconds between saves; 0 saves after every key
    #[arg(long)]
    save_interval: Option<u64>,

    /// Count upper- and lowercase letters as the same key
    #[arg(long)]
    fold_case: bool,

    /// Print the N most pressed keys from the tally file and exit
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    summary: Option<usize>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to keytally.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("keytally.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("{}, using defaults", e);
        KeytallyConfig::default()
    });
    let cli = CliOverrides {
        data_file: args.data_file,
        save_interval_secs: args.save_interval,
        fold_case: args.fold_case,
    };
    let resolved = config::resolve(&file_config, &cli);

    log::info!(
        "Keytally starting up: data file {}, {:?}",
        resolved.data_file.display(),
        resolved.save_policy
    );

    if let Some(limit) = args.summary {
        return app::print_summary(&resolved.data_file, limit);
    }

    app::run(resolved).await
}
