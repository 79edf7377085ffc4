use async_trait::async_trait;
use ethers::types::U256;
use log::{error, warn};
use std::sync::Arc;

use crate::abi::{calldata, TransferCall};
use crate::chain::{self, ChainClient};
use crate::config::ExecutionMode;
use crate::error::{AirdropError, Result};
use crate::executor::{RunContext, TransferExecutor};
use crate::metrics;
use crate::reporter::ProgressReporter;
use crate::types::{
    Asset, RecipientOutcome, RecipientStatus, ResolvedRecipient, RunOutcome, SequentialReport,
};
use crate::utils::{format_amount, format_native};

/// One transaction per recipient per asset. A failing recipient is recorded
/// and the loop moves on.
pub struct SequentialExecutor<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ChainClient + ?Sized> SequentialExecutor<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Both balances must cover the totals before anything is sent.
    async fn check_balances(&self, run: &RunContext, reporter: &dyn ProgressReporter) -> Result<()> {
        let totals = run.totals();
        let client = self.client.as_ref();
        let (token_balance, native_balance) = tokio::try_join!(
            chain::token_balance(client, run.token, run.sender),
            client.native_balance(run.sender)
        )?;

        reporter.emit(format!(
            "Your token balance: {} tokens",
            format_amount(token_balance, run.token_decimals)
        ));
        reporter.emit(format!("Your native balance: {}", format_native(native_balance)));

        if token_balance < totals.total_token {
            let err = AirdropError::insufficient(Asset::Token, totals.total_token, token_balance);
            reporter.emit(format!(
                "❌ Insufficient token balance. Need {}, have {} (short {})",
                format_amount(totals.total_token, run.token_decimals),
                format_amount(token_balance, run.token_decimals),
                format_amount(totals.total_token - token_balance, run.token_decimals)
            ));
            return Err(err);
        }
        if native_balance < totals.total_native {
            let err = AirdropError::insufficient(Asset::Native, totals.total_native, native_balance);
            reporter.emit(format!(
                "❌ Insufficient native balance. Need {}, have {} (short {})",
                format_native(totals.total_native),
                format_native(native_balance),
                format_native(totals.total_native - native_balance)
            ));
            return Err(err);
        }

        reporter.emit("✅ Sufficient balance for both assets. Starting airdrop...".to_string());
        Ok(())
    }

    /// Token leg then native leg, each confirmed before the next submission.
    /// The first failure ends this recipient.
    async fn send_legs(
        &self,
        run: &RunContext,
        recipient: &ResolvedRecipient,
        outcome: &mut RecipientOutcome,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        let client = self.client.as_ref();

        if !recipient.token_amount.is_zero() {
            reporter.emit(format!(
                "  Sending {} tokens...",
                format_amount(recipient.token_amount, run.token_decimals)
            ));
            let tx_hash = client
                .submit_contract_call(
                    run.token,
                    calldata(TransferCall {
                        recipient: recipient.address,
                        amount: recipient.token_amount,
                    }),
                    U256::zero(),
                )
                .await?;
            metrics::tx_submitted(metrics::KIND_TOKEN_TRANSFER);
            outcome.token_tx_hash = Some(tx_hash);
            reporter.emit(format!("  ✓ Tokens sent! Tx: {:?}", tx_hash));
            reporter.emit("  Waiting for confirmation...".to_string());

            let confirmation = chain::confirm(client, metrics::KIND_TOKEN_TRANSFER, tx_hash).await?;
            outcome.token_succeeded = true;
            reporter.emit(format!("  ✓ Confirmed in block {}", block_label(&confirmation.block_number)));
        }

        if !recipient.native_amount.is_zero() {
            reporter.emit(format!("  Sending {} native...", format_native(recipient.native_amount)));
            let tx_hash = client
                .submit_value_transfer(recipient.address, recipient.native_amount)
                .await?;
            metrics::tx_submitted(metrics::KIND_NATIVE_TRANSFER);
            outcome.native_tx_hash = Some(tx_hash);
            reporter.emit(format!("  ✓ Native sent! Tx: {:?}", tx_hash));
            reporter.emit("  Waiting for confirmation...".to_string());

            let confirmation = chain::confirm(client, metrics::KIND_NATIVE_TRANSFER, tx_hash).await?;
            outcome.native_succeeded = true;
            reporter.emit(format!("  ✓ Confirmed in block {}", block_label(&confirmation.block_number)));
        }

        Ok(())
    }

    async fn process(
        &self,
        run: &RunContext,
        recipient: &ResolvedRecipient,
        reporter: &dyn ProgressReporter,
    ) -> RecipientOutcome {
        let mut outcome = RecipientOutcome {
            recipient: recipient.address,
            token_tx_hash: None,
            native_tx_hash: None,
            token_succeeded: recipient.token_amount.is_zero(),
            native_succeeded: recipient.native_amount.is_zero(),
            status: RecipientStatus::Success,
            error: None,
        };

        if let Err(e) = self.send_legs(run, recipient, &mut outcome, reporter).await {
            warn!("recipient {:?} failed: {}", recipient.address, e);
            reporter.emit(format!("  ❌ Failed to send to {:?}: {}", recipient.address, e));
            outcome.status = RecipientStatus::Failed;
            outcome.error = Some(e.to_string());
        }

        metrics::recipient_processed(outcome.status);
        outcome
    }
}

#[async_trait]
impl<C: ChainClient + ?Sized> TransferExecutor for SequentialExecutor<C> {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Sequential
    }

    async fn execute(&self, run: &RunContext, reporter: &dyn ProgressReporter) -> Result<RunOutcome> {
        if !run.has_transfers() {
            reporter.emit("Nothing to do: no recipient has a non-zero amount".to_string());
            return Ok(RunOutcome::NothingToDo);
        }

        self.check_balances(run, reporter).await.map_err(|e| {
            error!("balance check failed: {}", e);
            e
        })?;

        reporter.emit("--- Starting Transactions ---".to_string());
        let mut report = SequentialReport {
            skipped: run.aggregation.skipped.len(),
            ..SequentialReport::default()
        };
        let count = run.recipients().len();

        for (position, recipient) in run.recipients().iter().enumerate() {
            if !recipient.has_transfers() {
                reporter.emit(format!(
                    "[{}/{}] {:?} has nothing to receive, skipping",
                    position + 1,
                    count,
                    recipient.address
                ));
                report.skipped += 1;
                continue;
            }

            reporter.emit(format!("[{}/{}] Airdropping to {:?}...", position + 1, count, recipient.address));
            let outcome = self.process(run, recipient, reporter).await;
            match outcome.status {
                RecipientStatus::Success => {
                    report.succeeded += 1;
                    reporter.emit("  ✅ Airdrop complete".to_string());
                }
                RecipientStatus::Failed => report.failed += 1,
            }
            report.outcomes.push(outcome);
        }

        reporter.emit(format!(
            "📊 Summary: ✓ Successful: {} ✗ Failed: {} 📝 Total: {}",
            report.succeeded,
            report.failed,
            report.outcomes.len()
        ));
        Ok(RunOutcome::Sequential(report))
    }
}

fn block_label(block: &Option<ethers::types::U64>) -> String {
    block.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string())
}
