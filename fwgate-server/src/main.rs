mod config;
use clap::{Parser, Subcommand};
use crate::config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod server;
use server::run_server;

#[derive(Parser)]
#[command(name = "fwgate")]
#[command(about = "Firmware update gating for gateway fleets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Server {
        /// Path to configuration file
        #[arg(short, long, default_value = "fwgate.yaml")]
        config: String,

        /// Load the built-in sample fleet in addition to configured nodes
        #[arg(long)]
        sample: bool,

        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the fleet a configuration resolves to, then exit
    Topology {
        /// Path to configuration file
        #[arg(short, long, default_value = "fwgate.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fwgate_server=info,fwgate_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server {
            config,
            sample,
            bind,
        } => {
            tracing::info!("Starting Fwgate server with config: {}", config);

            let mut cfg = match Config::from_file(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            if sample {
                cfg.topology.sample = true;
            }
            if let Some(bind) = bind {
                cfg.bind_addr = bind;
            }

            if let Err(e) = run_server(cfg).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Topology { config } => {
            let cfg = match Config::from_file(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = print_topology(&cfg).await {
                tracing::error!("Failed to resolve topology: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn print_topology(config: &Config) -> fwgate_core::Result<()> {
    let fleet = fwgate_core::Fleet::new(config.fleet_state()?);

    let uuids: Vec<fwgate_core::NodeUuid> = {
        let state = fleet.store().read().await;
        state.registry.nodes().map(|node| node.uuid().clone()).collect()
    };

    let mut nodes = Vec::with_capacity(uuids.len());
    for uuid in uuids {
        let Some(node) = fleet.query().node(&uuid).await else {
            continue;
        };

        let mut endpoints = Vec::with_capacity(node.endpoints.len());
        for serial in &node.endpoints {
            if let Some(endpoint) = fleet.query().endpoint(serial).await {
                endpoints.push(endpoint);
            }
        }

        nodes.push(serde_json::json!({ "node": node, "endpoints": endpoints }));
    }

    println!("{}", serde_json::to_string_pretty(&nodes)?);
    Ok(())
}
