//! Deploys the pool contracts.
//!
//! ```bash
//! pools deploy --network goerli DestinationPool
//! pools deploy --network mumbai DestinationPool 0x13576E2eeB9696e63f10DD2778697c84EAaF4872
//! pools networks
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use pool_deployer::{pools, Config, Connection, ContractFactory};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pools", version, about = "Deploy the pool contracts")]
struct Cli {
    /// Network configuration file, `deploy.toml` is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the compiled contract artifacts.
    #[arg(long, global = true, default_value = "artifacts")]
    artifacts: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy a contract and print its address.
    Deploy(DeployArgs),
    /// List the configured networks.
    Networks,
}

#[derive(Debug, Args)]
struct DeployArgs {
    /// Network to deploy to.
    #[arg(long, short, default_value = "hardhat")]
    network: String,

    /// Blocks to wait for after the deployment is mined.
    #[arg(long, default_value_t = 1)]
    confirmations: u64,

    /// Name of the contract, e.g. `OriginPool`.
    contract: String,

    /// Constructor arguments, pool contracts fall back to their defaults.
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Deploy(args) => deploy(&config, &cli.artifacts, args).await,
        Command::Networks => {
            networks(&config);
            Ok(())
        }
    }
}

async fn deploy(
    config: &Config,
    artifacts: &Path,
    args: DeployArgs,
) -> eyre::Result<()> {
    let target = config.resolve(&args.network)?;
    let factory = ContractFactory::load(artifacts, &args.contract)?;
    let ctr_args = pools::constructor_args(&args.contract, args.args);

    let connection = Connection::open(&target)?;
    info!(
        network = %target.name,
        url = %connection.url(),
        deployer = %connection.address(),
        "connected"
    );

    let deployment = connection
        .as_deployer()
        .with_constructor(ctr_args)
        .with_confirmations(args.confirmations)
        .deploy(&factory)
        .await?;

    println!("{deployment}");
    Ok(())
}

fn networks(config: &Config) {
    for (name, network) in &config.networks {
        println!("{name:<12} {network}");
    }

    let api_key = config.explorer_api_key(|key| std::env::var(key).ok());
    let status = if api_key.is_some() { "set" } else { "unset" };
    println!("explorer api key (${}): {status}", config.explorer.api_key_env);
}
