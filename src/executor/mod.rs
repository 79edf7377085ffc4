//! The two transfer strategies. Both consume the same prepared run (validated
//! token, resolved recipients, totals) and differ only in how they submit.

pub mod batched;
pub mod sequential;

use async_trait::async_trait;
use ethers::types::Address;

use crate::aggregator::Aggregation;
use crate::config::ExecutionMode;
use crate::error::Result;
use crate::reporter::ProgressReporter;
use crate::types::{AmountTotals, ResolvedRecipient, RunOutcome};

pub use batched::BatchedExecutor;
pub use sequential::SequentialExecutor;

/// Everything a strategy needs, computed once by the engine.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub token: Address,
    pub sender: Address,
    pub token_decimals: u8,
    pub aggregation: Aggregation,
}

impl RunContext {
    pub fn totals(&self) -> AmountTotals {
        self.aggregation.totals
    }

    pub fn recipients(&self) -> &[ResolvedRecipient] {
        &self.aggregation.recipients
    }

    pub fn has_transfers(&self) -> bool {
        self.aggregation.actionable().next().is_some()
    }
}

#[async_trait]
pub trait TransferExecutor: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    /// Plan and submit the run. Transactions are issued one at a time.
    async fn execute(&self, run: &RunContext, reporter: &dyn ProgressReporter) -> Result<RunOutcome>;
}
