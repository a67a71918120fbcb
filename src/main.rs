use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::info;

use wegman_chain::api::{self, AppState};
use wegman_chain::blockchain::Chain;
use wegman_chain::codec::Codec;
use wegman_chain::config::{ServerConfig, SwarmConfig};
use wegman_chain::miner::Swarm;
use wegman_chain::pow::DEFAULT_SEED_PROOF;

#[derive(Parser)]
#[command(version, about = "Minimal proof-of-work ledger")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the node HTTP API (HOST, PORT and SEED_PROOF from the environment).
    Serve,
    /// Spin up concurrent miners sharing one broadcast channel.
    Swarm {
        /// Target chain length, genesis included.
        #[arg(long, default_value_t = 2)]
        num_blocks: usize,
        #[arg(long, default_value_t = 3)]
        num_miners: usize,
        /// Guesses between two checks of the broadcast channel.
        #[arg(long, default_value_t = 10_000)]
        burst: u64,
        #[arg(long, default_value_t = DEFAULT_SEED_PROOF)]
        seed: u64,
    },
}

fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    match Args::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => actix_web::rt::System::new().block_on(serve(ServerConfig::from_env())),
        Command::Swarm {
            num_blocks,
            num_miners,
            burst,
            seed,
        } => swarm(num_blocks, num_miners, burst, seed).map_err(std::io::Error::other),
    }
}

async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let ServerConfig {
        host,
        port,
        seed_proof,
    } = config;

    let state = web::Data::new(AppState::new(seed_proof));
    println!(
        "⛓️ Starting node {} at http://{host}:{port} (seed proof {seed_proof})",
        state.node_id
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn swarm(num_blocks: usize, num_miners: usize, burst: u64, seed: u64) -> wegman_chain::Result<()> {
    let config = SwarmConfig {
        target_len: num_blocks,
        burst,
        ..SwarmConfig::default()
    }
    .with_miners(num_miners)?;

    info!("Initializing miners...");
    let chains = Swarm::new(config)?.run(&Chain::genesis(seed))?;

    if let Some(chain) = chains.first() {
        println!("Final blockchain:");
        for (i, block) in chain.blocks().iter().enumerate() {
            println!("Block #{i}: {}", block.to_json()?);
        }
    }
    Ok(())
}
