use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction, Command};
use commonware_runtime::{tokio, Metrics, Runner};
use croupier_node::{ledger, Config};
use croupier_types::casino::{Category, PoolKind};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::{error, info};

fn main() -> Result<()> {
    // Parse arguments
    let matches = Command::new("croupier")
        .about("Maintenance for a croupier ledger.")
        .arg(Arg::new("config").long("config").required(true))
        .arg(
            Arg::new("refresh")
                .long("refresh")
                .action(ArgAction::SetTrue)
                .help("Rebuild the cached leaderboard"),
        )
        .get_matches();
    let refresh = matches.get_flag("refresh");

    // Load config
    let config_file = matches
        .get_one::<String>("config")
        .context("missing --config")?;
    let config_file = std::fs::read_to_string(config_file)
        .with_context(|| format!("could not read config file {config_file}"))?;
    let config: Config = serde_yaml::from_str(&config_file).context("could not parse config file")?;
    let config = config.validate().context("invalid config")?;

    // Initialize runtime
    let cfg = tokio::Config::default()
        .with_worker_threads(config.worker_threads)
        .with_catch_panics(true);
    let executor = tokio::Runner::new(cfg);

    // Start runtime
    executor.start(|context| async move {
        // Configure telemetry
        tokio::telemetry::init(
            context.with_label("telemetry"),
            tokio::telemetry::Logging {
                level: config.log_level,
                json: config.log_json,
            },
            Some(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                config.metrics_port,
            )),
            None,
        );

        // Start ledger
        let (actor, mut mailbox) =
            ledger::Actor::new(context.with_label("ledger"), config.ledger());
        let handle = actor.start();
        info!(path = ?config.store_path, "ledger started");

        // Report
        let leaderboard = if refresh {
            mailbox.refresh_leaderboard().await
        } else {
            mailbox.leaderboard().await
        };
        match leaderboard {
            Ok(leaderboard) => {
                for category in Category::ALL {
                    for (rank, entry) in leaderboard.entries(category).iter().enumerate() {
                        info!(
                            ?category,
                            rank = rank + 1,
                            account = %entry.account,
                            value = entry.value,
                            "leaderboard"
                        );
                    }
                }
            }
            Err(err) => error!(?err, "failed to read leaderboard"),
        }
        for pool in PoolKind::ALL {
            match mailbox.peek(pool).await {
                Ok(amount) => info!(%pool, amount, "pool"),
                Err(err) => error!(%pool, ?err, "failed to read pool"),
            }
        }

        // Dropping the last mailbox stops the ledger
        drop(mailbox);
        if let Err(err) = handle.await {
            error!(?err, "ledger failed");
        }
    });
    Ok(())
}
