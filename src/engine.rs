use log::{error, info};
use std::sync::Arc;

use crate::aggregator::{aggregate, validate_token_address, AmountPolicy};
use crate::chain::{self, ChainClient};
use crate::config::{AirdropConfig, ExecutionMode};
use crate::constants::MAX_DECIMALS;
use crate::error::{AirdropError, Result};
use crate::executor::{BatchedExecutor, RunContext, SequentialExecutor, TransferExecutor};
use crate::metrics;
use crate::reporter::ProgressReporter;
use crate::types::{AirdropRequest, RunOutcome};
use crate::utils::{format_amount, format_native};

/// Entry point for one airdrop run: validate, read token precision, aggregate,
/// then hand off to the configured transfer strategy.
pub struct AirdropEngine<C: ChainClient + ?Sized + 'static> {
    client: Arc<C>,
    policy: AmountPolicy,
    executor: Box<dyn TransferExecutor>,
}

impl<C: ChainClient + ?Sized + 'static> AirdropEngine<C> {
    pub fn new(config: &AirdropConfig, client: Arc<C>) -> Self {
        let executor: Box<dyn TransferExecutor> = match config.mode {
            ExecutionMode::Batched => Box::new(BatchedExecutor::new(
                client.clone(),
                config.multicall_address,
                config.simulate_batch,
            )),
            ExecutionMode::Sequential => Box::new(SequentialExecutor::new(client.clone())),
        };
        Self::with_executor(client, config.amount_policy, executor)
    }

    pub fn with_executor(client: Arc<C>, policy: AmountPolicy, executor: Box<dyn TransferExecutor>) -> Self {
        Self {
            client,
            policy,
            executor,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.executor.mode()
    }

    pub async fn run(&self, request: &AirdropRequest, reporter: &dyn ProgressReporter) -> Result<RunOutcome> {
        let mode = self.mode();
        reporter.emit(format!("🚀 Starting Batch Airdrop ({mode} mode)..."));

        let result = self.execute(request, reporter).await;
        match &result {
            Ok(outcome) => {
                reporter.emit(summary(outcome));
                metrics::run_finished(mode_label(mode), outcome_label(outcome));
            }
            Err(e) => {
                error!("airdrop run failed: {}", e);
                reporter.emit(format!("❌ Error: {e}"));
                metrics::run_finished(mode_label(mode), "error");
            }
        }
        result
    }

    async fn execute(&self, request: &AirdropRequest, reporter: &dyn ProgressReporter) -> Result<RunOutcome> {
        let token = validate_token_address(&request.token_address)?;
        let sender = self.client.sender();
        reporter.emit(format!("Wallet: {sender:?}"));

        reporter.emit("Reading token info...".to_string());
        let token_decimals = chain::token_decimals(self.client.as_ref(), token).await?;
        if token_decimals > MAX_DECIMALS {
            return Err(AirdropError::InvalidInput(format!(
                "token {token:?} reports unsupported precision {token_decimals}"
            )));
        }
        reporter.emit(format!("Decimals: {token_decimals}"));

        let aggregation = aggregate(&request.recipients, token_decimals, self.policy, reporter)?;
        let totals = aggregation.totals;
        info!(
            "{} recipients resolved, {} skipped",
            aggregation.recipients.len(),
            aggregation.skipped.len()
        );
        reporter.emit(format!(
            "Total Main Token Required: {}",
            format_amount(totals.total_token, token_decimals)
        ));
        reporter.emit(format!("Total Native Required: {}", format_native(totals.total_native)));

        let run = RunContext {
            token,
            sender,
            token_decimals,
            aggregation,
        };
        self.executor.execute(&run, reporter).await
    }
}

fn mode_label(mode: ExecutionMode) -> &'static str {
    match mode {
        ExecutionMode::Batched => "batched",
        ExecutionMode::Sequential => "sequential",
    }
}

fn outcome_label(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::NothingToDo => "nothing_to_do",
        RunOutcome::Batched(_) => "success",
        RunOutcome::Sequential(report) if report.failed == 0 => "success",
        RunOutcome::Sequential(_) => "partial",
    }
}

fn summary(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::NothingToDo => "Nothing was sent".to_string(),
        RunOutcome::Batched(batch) => format!(
            "🎉 Airdrop complete! {} transfers in tx {:?}",
            batch.call_count, batch.tx_hash
        ),
        RunOutcome::Sequential(report) => format!(
            "🎉 Airdrop finished: {} succeeded, {} failed, {} skipped",
            report.succeeded, report.failed, report.skipped
        ),
    }
}
