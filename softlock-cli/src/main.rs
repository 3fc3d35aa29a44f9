mod handlers;
mod server;
#[cfg(test)]
mod server_test;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use softlock_core::config::DEFAULT_LEASE_DURATION_MINUTES;
use softlock_core::types::LeaseResult;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "softlock",
    about = "softlock — advisory edit leases for shared resources",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StorageArgs {
    /// Storage backend: "memory" or "sqlite:<path>"
    #[arg(long, default_value = "memory", env = "SOFTLOCK_STORAGE")]
    storage: String,

    /// How long a lease lives without renewal
    #[arg(long, default_value_t = DEFAULT_LEASE_DURATION_MINUTES, env = "SOFTLOCK_LEASE_DURATION_MINUTES")]
    lease_duration_minutes: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the softlock HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3200")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Requests processed at once; the rest queue at the socket
        #[arg(long, default_value = "256")]
        max_concurrent_requests: usize,

        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Acquire or renew a lease and print the outcome as JSON
    Acquire {
        #[arg(long)]
        holder_id: String,
        #[arg(long)]
        holder_address: String,
        #[arg(long)]
        resource_type: String,
        #[arg(long)]
        resource_id: String,

        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Release every lease of a holder
    Release {
        #[arg(long)]
        holder_id: String,
        #[arg(long)]
        holder_address: String,

        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Delete expired leases
    Sweep {
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode, String> {
    match command {
        Commands::Serve {
            port,
            host,
            max_concurrent_requests,
            storage,
        } => {
            let client = server::create_client(&storage.storage, storage.lease_duration_minutes)?;
            server::run(&host, port, client, max_concurrent_requests)
                .await
                .map_err(|e| format!("Server error: {}", e))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Acquire {
            holder_id,
            holder_address,
            resource_type,
            resource_id,
            storage,
        } => {
            let mut client = server::create_client(&storage.storage, storage.lease_duration_minutes)?;
            let result = client
                .acquire_lease(&holder_id, &holder_address, &resource_type, &resource_id)
                .map_err(|e| e.to_string())?;

            let (output, code) = match result {
                LeaseResult::Acquired { lease } | LeaseResult::Renewed { lease } => {
                    let expires_at = client.expires_at(&lease);
                    (
                        serde_json::json!(handlers::LeaseResponse::new(&lease, expires_at)),
                        ExitCode::SUCCESS,
                    )
                }
                LeaseResult::Conflict(conflict) => (
                    serde_json::json!(handlers::ConflictResponse::from(&conflict)),
                    // 2: resource busy
                    ExitCode::from(2),
                ),
            };
            print_json(&output)?;
            Ok(code)
        }
        Commands::Release {
            holder_id,
            holder_address,
            storage,
        } => {
            let mut client = server::create_client(&storage.storage, storage.lease_duration_minutes)?;
            let released = client
                .release(&holder_id, &holder_address)
                .map_err(|e| e.to_string())?;
            print_json(&serde_json::json!(handlers::ReleaseResponse { released }))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sweep { storage } => {
            let mut client = server::create_client(&storage.storage, storage.lease_duration_minutes)?;
            let swept = client.sweep_expired().map_err(|e| e.to_string())?;
            print_json(&serde_json::json!(handlers::SweepResponse { swept }))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("softlock {}", env!("CARGO_PKG_VERSION"));
            println!("Advisory edit leases for shared resources");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}
