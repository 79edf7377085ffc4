use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use log::{error, warn};
use std::sync::Arc;

use crate::abi::{decode_return, revert_reason, Aggregate3ValueReturn};
use crate::authorization::AuthorizationManager;
use crate::chain::{self, ChainClient};
use crate::config::ExecutionMode;
use crate::error::Result;
use crate::executor::{RunContext, TransferExecutor};
use crate::metrics;
use crate::plan::{build_plan, BatchPlan};
use crate::reporter::ProgressReporter;
use crate::types::{BatchOutcome, CallFailure, RunOutcome};
use crate::utils::{format_amount, format_native};

/// Approve if needed, then move everything through one `aggregate3Value` call.
pub struct BatchedExecutor<C: ?Sized> {
    client: Arc<C>,
    multicall: Address,
    simulate: bool,
}

impl<C: ChainClient + ?Sized> BatchedExecutor<C> {
    pub fn new(client: Arc<C>, multicall: Address, simulate: bool) -> Self {
        Self {
            client,
            multicall,
            simulate,
        }
    }

    /// Dry-run the batch and collect the calls that would fail inside it. A
    /// revert of the whole batch is returned as an error.
    async fn simulate_batch(
        &self,
        plan: &BatchPlan,
        data: Bytes,
        value: U256,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<CallFailure>> {
        reporter.emit(format!("Simulating batch of {} calls...", plan.calls.len()));
        let raw = self
            .client
            .simulate_contract_call(self.multicall, data, value)
            .await
            .map_err(|e| {
                error!("batch simulation failed: {}", e);
                e
            })?;

        let results = decode_return::<Aggregate3ValueReturn>(&raw)?.return_data;
        if results.len() != plan.calls.len() {
            warn!(
                "simulation returned {} results for {} calls",
                results.len(),
                plan.calls.len()
            );
        }

        let failures: Vec<CallFailure> = results
            .iter()
            .zip(plan.calls.iter())
            .enumerate()
            .filter(|(_, (result, _))| !result.0)
            .map(|(index, (result, call))| CallFailure {
                index,
                target: call.target,
                reason: revert_reason(&result.1),
            })
            .collect();

        if failures.is_empty() {
            reporter.emit("✓ Simulation passed for every call".to_string());
        }
        for failure in &failures {
            warn!("call #{} to {:?} would fail: {}", failure.index, failure.target, failure.reason);
            reporter.emit(format!(
                "  ⚠️ Call #{} to {:?} is expected to fail: {}",
                failure.index + 1,
                failure.target,
                failure.reason
            ));
        }
        Ok(failures)
    }
}

#[async_trait]
impl<C: ChainClient + ?Sized> TransferExecutor for BatchedExecutor<C> {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Batched
    }

    async fn execute(&self, run: &RunContext, reporter: &dyn ProgressReporter) -> Result<RunOutcome> {
        let totals = run.totals();
        if !run.has_transfers() {
            reporter.emit("Nothing to do: no recipient has a non-zero amount".to_string());
            return Ok(RunOutcome::NothingToDo);
        }

        let authorization = if totals.total_token.is_zero() {
            reporter.emit("No token transfers, allowance check skipped".to_string());
            None
        } else {
            let manager = AuthorizationManager::new(self.client.clone());
            Some(
                manager
                    .ensure(run.token, self.multicall, totals.total_token, run.token_decimals, reporter)
                    .await?,
            )
        };

        reporter.emit("--- Building batch ---".to_string());
        let plan = build_plan(
            run.token,
            run.sender,
            run.recipients(),
            totals,
            run.token_decimals,
            reporter,
        )?;
        if plan.is_empty() {
            reporter.emit("Nothing to do: batch is empty".to_string());
            return Ok(RunOutcome::NothingToDo);
        }

        let value = plan.native_value()?;
        let data = plan.encode();
        let simulated_failures = if self.simulate {
            self.simulate_batch(&plan, data.clone(), value, reporter).await?
        } else {
            Vec::new()
        };

        reporter.emit(format!(
            "Submitting batch: {} calls, {} tokens, {} native attached...",
            plan.calls.len(),
            format_amount(totals.total_token, run.token_decimals),
            format_native(value)
        ));
        let tx_hash = self
            .client
            .submit_contract_call(self.multicall, data, value)
            .await
            .map_err(|e| {
                error!("batch submission failed: {}", e);
                e
            })?;
        metrics::tx_submitted(metrics::KIND_BATCH);
        reporter.emit(format!("✓ Batch sent! Tx: {:?}", tx_hash));
        reporter.emit("Waiting for confirmation...".to_string());

        let confirmation = chain::confirm(self.client.as_ref(), metrics::KIND_BATCH, tx_hash)
            .await
            .map_err(|e| {
                error!("batch {:?} did not confirm: {}", tx_hash, e);
                e
            })?;
        let block = confirmation
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string());
        reporter.emit(format!("✓ Batch confirmed in block {block}"));

        // Per-call results of a mined transaction are not visible here, so the
        // simulation is the only per-call signal.
        if !simulated_failures.is_empty() {
            reporter.emit(format!(
                "⚠️ {} call(s) were expected to fail inside the confirmed batch",
                simulated_failures.len()
            ));
        }

        Ok(RunOutcome::Batched(BatchOutcome {
            tx_hash,
            block_number: confirmation.block_number,
            call_count: plan.calls.len(),
            totals,
            authorization_tx: authorization.and_then(|a| a.tx_hash()),
            simulated_failures,
        }))
    }
}
