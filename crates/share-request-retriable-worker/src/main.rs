//! share-mq binary entry point.
//!
//! Usage: share-mq [--log-level <level>] [--database <path>] <command>

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use share_mq_config_and_utils::{init_logging, Config, Paths};
use share_mq_database::{queries, AsyncDatabase, NewShareRequest, Protocol};
use share_request_retriable_worker::{decode_payload, RunContext, ShareRequestsJob};
use std::path::PathBuf;
use tracing::{error, info};

/// Outbound federation share notification queue.
#[derive(Parser, Debug)]
#[command(name = "share-mq")]
#[command(about = "Retrying delivery queue for outbound federation share notifications")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Queue database path
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one dispatcher step
    Run {
        /// Drain the whole queue instead of a periodic batch
        #[arg(short, long)]
        interactive: bool,
    },
    /// Run a periodic step every interval until interrupted
    Serve {
        /// Seconds between steps
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Queue a share notification
    Enqueue {
        /// Destination host and path, without scheme
        #[arg(long)]
        url: String,
        /// JSON object posted as form fields
        #[arg(long)]
        payload: String,
        /// User whose trusted certificates are used
        #[arg(long)]
        owner: String,
        /// Delivery scheme; unknown probes https then http
        #[arg(long, value_enum, default_value = "unknown")]
        protocol: SchemeArg,
    },
    /// Show queued share notifications
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Remove a queued share notification
    Cancel {
        /// Share request ID
        id: i64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemeArg {
    Http,
    Https,
    Unknown,
}

impl From<SchemeArg> for Protocol {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Http => Protocol::Http,
            SchemeArg::Https => Protocol::Https,
            SchemeArg::Unknown => Protocol::Unknown,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Paths::new()?;
    let mut config = Config::load(&paths).context("loading configuration")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    init_logging(&config.log_level, &paths);

    match cli.command {
        Commands::Run { interactive } => {
            let context = if interactive {
                RunContext::Interactive
            } else {
                RunContext::Periodic
            };
            let job = ShareRequestsJob::open(&config, &paths).await?;
            let report = job.run(context).await?;
            println!(
                "fetched {} delivered {} failed {} updated {} evicted {}",
                report.fetched, report.delivered, report.failed, report.updated, report.evicted
            );
        }
        Commands::Serve { interval_secs } => {
            if let Some(secs) = interval_secs {
                config.interval_secs = secs;
                config.validate()?;
            }
            let job = ShareRequestsJob::open(&config, &paths).await?;
            info!(interval_secs = config.interval_secs, "share-mq serving");
            job.serve(shutdown_signal()).await;
        }
        Commands::Enqueue {
            url,
            payload,
            owner,
            protocol,
        } => {
            decode_payload(&payload)?;
            let db = open_database(&config, &paths).await?;
            let request = NewShareRequest {
                url,
                payload,
                protocol: protocol.into(),
                owner_user_id: owner,
            };
            let stored = db
                .call(move |conn| queries::insert_share_request(conn, &request))
                .await?;
            info!(request_id = stored.id, url = %stored.url, "Share request queued");
            println!("{}", stored.id);
        }
        Commands::List { json } => {
            let db = open_database(&config, &paths).await?;
            let requests = db.call(queries::list_share_requests).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&requests)?);
            } else if requests.is_empty() {
                println!("Queue is empty.");
            } else {
                println!("{:<8} {:<6} {:<9} {:<16} URL", "ID", "TRIES", "PROTOCOL", "OWNER");
                for request in &requests {
                    println!(
                        "{:<8} {:<6} {:<9} {:<16} {}",
                        request.id,
                        request.tries,
                        request.protocol.to_string(),
                        request.owner_user_id,
                        request.url
                    );
                }
            }
        }
        Commands::Cancel { id } => {
            let db = open_database(&config, &paths).await?;
            if db.call(move |conn| queries::delete_share_request(conn, id)).await? {
                info!(request_id = id, "Share request cancelled");
                println!("Cancelled {}", id);
            } else {
                anyhow::bail!("No queued share request with id {}", id);
            }
        }
    }

    Ok(())
}

async fn open_database(config: &Config, paths: &Paths) -> anyhow::Result<AsyncDatabase> {
    let path = config.database_file(paths);
    AsyncDatabase::open(&path)
        .await
        .with_context(|| format!("opening queue database {}", path.display()))
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, exiting..."),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_interactive() {
        let cli = Cli::try_parse_from(["share-mq", "run", "--interactive"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { interactive: true }));
    }

    #[test]
    fn enqueue_protocol_defaults_to_unknown() {
        let cli = Cli::try_parse_from([
            "share-mq",
            "enqueue",
            "--url",
            "remote.example/ocs",
            "--payload",
            "{}",
            "--owner",
            "alice",
        ])
        .unwrap();
        match cli.command {
            Commands::Enqueue { protocol, .. } => {
                assert_eq!(Protocol::from(protocol), Protocol::Unknown)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["share-mq", "cancel", "7", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Cancel { id: 7 }));
    }
}
