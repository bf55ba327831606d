use clap::Parser;
use signal_bot::cli::{print_config, print_status, Cli, Commands};
use signal_bot::config::Config;
use signal_bot::pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using bundled example configuration");
            let config: Config = toml::from_str(include_str!("../config.toml.example"))?;
            config.validate()?;
            config
        }
    };

    // Initialize telemetry; metrics are flushed when the guard drops
    let _telemetry = signal_bot::telemetry::init_telemetry(&config.telemetry)?;

    let pipeline = Pipeline::from_config(config)?;
    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting daily run");
            args.execute(&pipeline).await?;
        }
        Commands::Scan(args) => args.execute(&pipeline).await?,
        Commands::Resolve(args) => {
            tracing::info!("Resolving open positions");
            args.execute(&pipeline).await?;
        }
        Commands::Calibrate(args) => args.execute(&pipeline).await?,
        Commands::Status => print_status(&pipeline).await?,
        Commands::Config => print_config(pipeline.config()),
    }

    Ok(())
}
