use ethers::types::{Address, Bytes, H256, U256, U64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One airdrop line as entered by the caller. Amounts stay human decimal strings
/// until the aggregator resolves them against the asset precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    #[serde(default, alias = "main_token_amount", alias = "token")]
    pub token_amount: String,
    #[serde(default, alias = "gas_token_amount", alias = "native")]
    pub native_amount: String,
}

impl Recipient {
    pub fn new(
        address: impl Into<String>,
        token_amount: impl Into<String>,
        native_amount: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            token_amount: token_amount.into(),
            native_amount: native_amount.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirdropRequest {
    pub token_address: String,
    pub recipients: Vec<Recipient>,
}

/// A recipient whose address parsed and whose amounts are in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    /// Position in the caller's list, 0-based.
    pub index: usize,
    pub address: Address,
    pub token_amount: U256,
    pub native_amount: U256,
}

impl ResolvedRecipient {
    pub fn has_transfers(&self) -> bool {
        !self.token_amount.is_zero() || !self.native_amount.is_zero()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AmountTotals {
    pub total_token: U256,
    pub total_native: U256,
}

/// One entry of a Multicall3 `aggregate3Value` batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallItem {
    pub target: Address,
    pub allow_failure: bool,
    pub value: U256,
    pub call_data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorizationState {
    pub owner: Address,
    pub spender: Address,
    pub current_allowance: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Asset {
    Token,
    Native,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Token => write!(f, "token"),
            Asset::Native => write!(f, "native"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Success,
    Failed,
}

/// Result of one recipient in sequential mode. `token_succeeded` and
/// `native_succeeded` are true when the leg confirmed or had nothing to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub recipient: Address,
    pub token_tx_hash: Option<H256>,
    pub native_tx_hash: Option<H256>,
    pub token_succeeded: bool,
    pub native_succeeded: bool,
    pub status: RecipientStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxConfirmation {
    pub tx_hash: H256,
    pub block_number: Option<U64>,
    pub succeeded: bool,
}

/// A call item the pre-submission simulation reported as failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallFailure {
    pub index: usize,
    pub target: Address,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub tx_hash: H256,
    pub block_number: Option<U64>,
    pub call_count: usize,
    pub totals: AmountTotals,
    pub authorization_tx: Option<H256>,
    pub simulated_failures: Vec<CallFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequentialReport {
    pub outcomes: Vec<RecipientOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    NothingToDo,
    Batched(BatchOutcome),
    Sequential(SequentialReport),
}
