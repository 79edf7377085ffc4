use ethers::types::{Address, H256, U256};
use std::time::Duration;
use thiserror::Error;

use crate::types::Asset;

#[derive(Debug, Error)]
pub enum AirdropError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid amount format {value:?} for recipient {recipient}")]
    InvalidAmountFormat { recipient: String, value: String },

    #[error(
        "insufficient {asset} balance: need {required}, have {available} (short by {shortfall})"
    )]
    InsufficientBalance {
        asset: Asset,
        required: U256,
        available: U256,
        shortfall: U256,
    },

    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    #[error("transaction {tx_hash:?} failed to confirm: {reason}")]
    ConfirmationFailed { tx_hash: H256, reason: String },

    #[error("transaction {tx_hash:?} not confirmed after {waited:?}")]
    ConfirmationTimeout { tx_hash: H256, waited: Duration },

    #[error("chain read from {target:?} failed: {reason}")]
    ChainRead { target: Address, reason: String },

    #[error("abi error: {0}")]
    Encoding(String),

    #[error("batch plan invariant violated: {0}")]
    PlanInvariant(String),
}

impl AirdropError {
    pub fn insufficient(asset: Asset, required: U256, available: U256) -> Self {
        Self::InsufficientBalance {
            asset,
            required,
            available,
            shortfall: required.saturating_sub(available),
        }
    }
}

pub type Result<T, E = AirdropError> = std::result::Result<T, E>;
