pub mod provider;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
#[cfg(test)]
use mockall::automock;
use std::time::Instant;

use crate::abi::{
    calldata, decode_return, AllowanceCall, AllowanceReturn, BalanceOfCall, BalanceOfReturn, DecimalsCall,
    DecimalsReturn,
};
use crate::error::{AirdropError, Result};
use crate::metrics;
use crate::types::TxConfirmation;

pub use provider::EthersChainClient;

/// Everything the engine needs from a node: reads, signed nonce-sequenced
/// submissions and confirmation waits. Submissions come from `sender()`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn sender(&self) -> Address;

    /// `eth_call` against a contract, returning the raw return data.
    async fn read_contract(&self, target: Address, data: Bytes) -> Result<Bytes>;

    /// `eth_call` from the sender with value attached, used to dry-run a write.
    async fn simulate_contract_call(&self, target: Address, data: Bytes, value: U256) -> Result<Bytes>;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    async fn submit_contract_call(&self, target: Address, data: Bytes, value: U256) -> Result<H256>;

    async fn submit_value_transfer(&self, to: Address, value: U256) -> Result<H256>;

    /// Blocks until the transaction is mined or the client's wait bound expires.
    async fn wait_for_confirmation(&self, tx_hash: H256) -> Result<TxConfirmation>;
}

pub async fn token_decimals<C: ChainClient + ?Sized>(client: &C, token: Address) -> Result<u8> {
    let data = client.read_contract(token, calldata(DecimalsCall)).await?;
    Ok(decode_return::<DecimalsReturn>(&data)?.0)
}

pub async fn token_balance<C: ChainClient + ?Sized>(client: &C, token: Address, owner: Address) -> Result<U256> {
    let data = client
        .read_contract(token, calldata(BalanceOfCall { account: owner }))
        .await?;
    Ok(decode_return::<BalanceOfReturn>(&data)?.0)
}

pub async fn token_allowance<C: ChainClient + ?Sized>(
    client: &C,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = client
        .read_contract(token, calldata(AllowanceCall { owner, spender }))
        .await?;
    Ok(decode_return::<AllowanceReturn>(&data)?.0)
}

/// Wait for `tx_hash` and turn a reverted receipt into `ConfirmationFailed`.
/// `kind` labels the transaction in metrics.
pub async fn confirm<C: ChainClient + ?Sized>(client: &C, kind: &'static str, tx_hash: H256) -> Result<TxConfirmation> {
    let started = Instant::now();
    let confirmation = match client.wait_for_confirmation(tx_hash).await {
        Ok(confirmation) => confirmation,
        Err(e) => {
            metrics::tx_failed(kind);
            return Err(e);
        }
    };
    if !confirmation.succeeded {
        metrics::tx_failed(kind);
        let block = confirmation
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(AirdropError::ConfirmationFailed {
            tx_hash,
            reason: format!("reverted in block {block}"),
        });
    }
    metrics::tx_confirmed(kind, started.elapsed());
    Ok(confirmation)
}
