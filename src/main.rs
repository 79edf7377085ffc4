use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use indoc::printdoc;
use log::{debug, info, LevelFilter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{env, path::PathBuf, sync::Arc};

use airdrop_engine::{
    chain::ChainClient,
    config::AirdropConfig,
    engine::AirdropEngine,
    recipients::load_recipients,
    reporter::RunLog,
    types::{AirdropRequest, RunOutcome},
    utils::setup_logger,
    EthersChainClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (.env first) and logging
    let config = AirdropConfig::from_env()?;
    let level = if config.debug { LevelFilter::Debug } else { LevelFilter::Info };
    setup_logger(level)?;
    debug!("Loaded config: {}", config.redacted());

    if let Some(port) = config.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("failed to start metrics exporter")?;
        info!("Metrics exposed on :{}", port);
    }

    // Usage: airdrop [TOKEN_ADDRESS] [RECIPIENTS_CSV]
    let mut args = env::args().skip(1);
    let token_address = args
        .next()
        .or_else(|| env::var("TOKEN_ADDRESS").ok())
        .ok_or_else(|| anyhow!("usage: airdrop <TOKEN_ADDRESS> [RECIPIENTS_CSV]"))?;
    let recipients_path = args
        .next()
        .map(PathBuf::from)
        .or_else(|| config.recipients_path.clone())
        .ok_or_else(|| anyhow!("no recipients file given and RECIPIENTS_CSV is not set"))?;
    let recipients = load_recipients(&recipients_path)?;

    let client = Arc::new(EthersChainClient::connect(&config)?);
    let sender = client.sender();
    let engine = AirdropEngine::new(&config, client);

    printdoc! {"

        ==============================
           Batch Airdrop ({mode})
        ==============================
        Chain ID:   {chain}
        RPC:        {rpc}
        Sender:     {sender:?}
        Token:      {token}
        Recipients: {count} from {path}

        ",
        mode = engine.mode(),
        chain = config.chain_id,
        rpc = config.rpc_url,
        sender = sender,
        token = token_address,
        count = recipients.len(),
        path = recipients_path.display(),
    };

    let request = AirdropRequest {
        token_address,
        recipients,
    };
    let log = RunLog::new();

    let outcome = match engine.run(&request, &log).await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{} {}", "Airdrop failed:".red().bold(), e);
            return Err(e.into());
        }
    };

    print_summary(&outcome);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NothingToDo => println!("{}", "Nothing to send.".yellow()),
        RunOutcome::Batched(batch) => {
            println!("{}", "Batch airdrop confirmed".green().bold());
            println!("  Tx:    {:?}", batch.tx_hash);
            println!("  Calls: {}", batch.call_count);
            if let Some(tx) = batch.authorization_tx {
                println!("  Approve tx: {:?}", tx);
            }
            for failure in &batch.simulated_failures {
                println!(
                    "  {} call #{} to {:?}: {}",
                    "expected failure".yellow(),
                    failure.index + 1,
                    failure.target,
                    failure.reason
                );
            }
        }
        RunOutcome::Sequential(report) => {
            println!("{}", "Sequential airdrop finished".green().bold());
            println!("  {} {}", "✓ Successful:".green(), report.succeeded);
            println!("  {} {}", "✗ Failed:".red(), report.failed);
            println!("  Skipped: {}", report.skipped);
            for failed in report.outcomes.iter().filter(|o| o.error.is_some()) {
                println!(
                    "  {} {:?}: {}",
                    "failed".red(),
                    failed.recipient,
                    failed.error.as_deref().unwrap_or_default()
                );
            }
        }
    }
}
