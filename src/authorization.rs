use ethers::types::{Address, H256, U256, U64};
use log::{error, info};
use std::sync::Arc;

use crate::abi::{calldata, ApproveCall};
use crate::chain::{self, ChainClient};
use crate::error::{AirdropError, Result};
use crate::metrics;
use crate::reporter::ProgressReporter;
use crate::types::AuthorizationState;
use crate::utils::format_amount;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    /// Existing allowance already covers the run, nothing was sent.
    Sufficient(AuthorizationState),
    /// An approve for exactly the required amount was mined.
    Raised {
        previous: AuthorizationState,
        approved: U256,
        tx_hash: H256,
        block_number: Option<U64>,
    },
}

impl AuthorizationResult {
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            Self::Sufficient(_) => None,
            Self::Raised { tx_hash, .. } => Some(*tx_hash),
        }
    }
}

/// Makes sure the batch executor may pull the run's token total from the sender.
/// Allowance is read fresh on every call, never cached.
pub struct AuthorizationManager<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ChainClient + ?Sized> AuthorizationManager<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn current_state(&self, token: Address, spender: Address) -> Result<AuthorizationState> {
        let owner = self.client.sender();
        let current_allowance = chain::token_allowance(self.client.as_ref(), token, owner, spender).await?;
        Ok(AuthorizationState {
            owner,
            spender,
            current_allowance,
        })
    }

    pub async fn ensure(
        &self,
        token: Address,
        spender: Address,
        required: U256,
        decimals: u8,
        reporter: &dyn ProgressReporter,
    ) -> Result<AuthorizationResult> {
        reporter.emit(format!("Checking allowance for batch executor {:?}...", spender));
        let state = self.current_state(token, spender).await?;

        if state.current_allowance >= required {
            reporter.emit(format!(
                "✓ Allowance sufficient: {} (required {})",
                format_amount(state.current_allowance, decimals),
                format_amount(required, decimals)
            ));
            return Ok(AuthorizationResult::Sufficient(state));
        }

        reporter.emit(format!(
            "Allowance {} is below required {}, approving...",
            format_amount(state.current_allowance, decimals),
            format_amount(required, decimals)
        ));

        // Absolute amount, not unlimited and not the delta.
        let tx_hash = self
            .client
            .submit_contract_call(token, calldata(ApproveCall { spender, amount: required }), U256::zero())
            .await
            .map_err(|e| authorization_failed("approve submission", e))?;
        metrics::tx_submitted(metrics::KIND_APPROVE);
        reporter.emit(format!("  ✓ Approval sent! Tx: {:?}", tx_hash));

        let confirmation = chain::confirm(self.client.as_ref(), metrics::KIND_APPROVE, tx_hash)
            .await
            .map_err(|e| authorization_failed("approve confirmation", e))?;

        let block = confirmation
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string());
        info!("approval {:?} mined in block {}", tx_hash, block);
        reporter.emit(format!("  ✓ Approval confirmed in block {block}"));

        Ok(AuthorizationResult::Raised {
            previous: state,
            approved: required,
            tx_hash,
            block_number: confirmation.block_number,
        })
    }
}

fn authorization_failed(stage: &str, cause: AirdropError) -> AirdropError {
    error!("{} failed: {}", stage, cause);
    AirdropError::AuthorizationFailed(format!("{stage}: {cause}"))
}
