use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use icyroute::{
    AppState, DriverExperience, IcyRouteConfig, RoutePlanner, RouteRequest, logging, web,
};

#[derive(Parser)]
#[command(name = "icyroute", version, about = "Winter route planning with ice risk assessment")]
struct Cli {
    /// Configuration file, defaults to <config dir>/icyroute/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Plan one trip and print the JSON response
    Plan {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        #[arg(long, default_value_t = DriverExperience::Intermediate)]
        experience: DriverExperience,
        /// Order routes by ice risk instead of travel time
        #[arg(long)]
        avoid_icy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = IcyRouteConfig::load_from_path(cli.config)?;
    logging::init_tracing(&config.logging)?;

    let planner = Arc::new(RoutePlanner::from_config(&config)?);

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            web::run(&config.server.host, port, AppState { planner }).await
        }
        Command::Plan {
            origin,
            destination,
            experience,
            avoid_icy,
        } => {
            let request = RouteRequest {
                origin,
                destination,
                driver_experience: experience,
                avoid_icy,
            };
            let response = planner.plan(&request).await?;
            let json = serde_json::to_string_pretty(&response)
                .with_context(|| "Failed to encode response")?;
            println!("{json}");
            Ok(())
        }
    }
}
