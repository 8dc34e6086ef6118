use clap::Parser;
use notaris_backoffice::{app, config::Config};
use std::path::PathBuf;

/// Back-office server for a notary and land deed official.
#[derive(Parser)]
#[command(name = "notaris-backoffice", version, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = "notaris.json")]
    config: PathBuf,

    /// Listen address, e.g. 0.0.0.0:3000
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory holding the JSON data files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory whose uploads/ subdirectory is served
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?.with_env();
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.public_dir {
        config.public_dir = dir;
    }

    app::run(config).await?;

    Ok(())
}
