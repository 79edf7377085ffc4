use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U256, U64},
};
use log::{debug, warn};
use std::{sync::Arc, time::Duration};
use tokio::time::{sleep, timeout, Instant};

use crate::chain::ChainClient;
use crate::config::AirdropConfig;
use crate::error::{AirdropError, Result};
use crate::types::TxConfirmation;

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// `ChainClient` over any ethers middleware stack that can sign for `sender`.
pub struct EthersChainClient<M> {
    client: Arc<M>,
    sender: Address,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl EthersChainClient<SignerClient> {
    /// HTTP provider plus a local wallet bound to the configured chain id.
    pub fn connect(config: &AirdropConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| AirdropError::InvalidInput(format!("bad rpc url {}: {e}", config.rpc_url)))?
            .interval(config.poll_interval());
        let wallet = config
            .private_key
            .parse::<LocalWallet>()
            .map_err(|e| AirdropError::InvalidInput(format!("bad private key: {e}")))?
            .with_chain_id(config.chain_id);
        let sender = wallet.address();

        Ok(Self::new(
            Arc::new(SignerMiddleware::new(provider, wallet)),
            sender,
            config.poll_interval(),
            config.confirmation_timeout(),
        ))
    }
}

impl<M> EthersChainClient<M> {
    pub fn new(client: Arc<M>, sender: Address, poll_interval: Duration, confirmation_timeout: Duration) -> Self {
        Self {
            client,
            sender,
            poll_interval,
            confirmation_timeout,
        }
    }
}

impl<M: Middleware + 'static> EthersChainClient<M> {
    async fn send(&self, tx: TransactionRequest) -> Result<H256> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| AirdropError::SubmissionFailed(e.to_string()))?;
        Ok(pending.tx_hash())
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainClient for EthersChainClient<M> {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn read_contract(&self, target: Address, data: Bytes) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(target).data(data).into();
        self.client
            .call(&tx, None)
            .await
            .map_err(|e| AirdropError::ChainRead { target, reason: e.to_string() })
    }

    async fn simulate_contract_call(&self, target: Address, data: Bytes, value: U256) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new()
            .from(self.sender)
            .to(target)
            .data(data)
            .value(value)
            .into();
        self.client
            .call(&tx, None)
            .await
            .map_err(|e| AirdropError::SubmissionFailed(format!("simulation reverted: {e}")))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.client
            .get_balance(owner, None)
            .await
            .map_err(|e| AirdropError::ChainRead { target: owner, reason: e.to_string() })
    }

    async fn submit_contract_call(&self, target: Address, data: Bytes, value: U256) -> Result<H256> {
        let tx = TransactionRequest::new()
            .from(self.sender)
            .to(target)
            .data(data)
            .value(value);
        self.send(tx).await
    }

    async fn submit_value_transfer(&self, to: Address, value: U256) -> Result<H256> {
        let tx = TransactionRequest::new().from(self.sender).to(to).value(value);
        self.send(tx).await
    }

    async fn wait_for_confirmation(&self, tx_hash: H256) -> Result<TxConfirmation> {
        let started = Instant::now();
        let receipt = timeout(self.confirmation_timeout, async {
            loop {
                match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => break receipt,
                    Ok(None) => sleep(self.poll_interval).await,
                    Err(e) => {
                        warn!("receipt lookup for {:?} failed: {}", tx_hash, e);
                        sleep(self.poll_interval).await;
                    }
                }
            }
        })
        .await
        .map_err(|_| AirdropError::ConfirmationTimeout {
            tx_hash,
            waited: self.confirmation_timeout,
        })?;

        debug!("receipt for {:?} after {:?}", tx_hash, started.elapsed());
        Ok(TxConfirmation {
            tx_hash,
            block_number: receipt.block_number,
            succeeded: receipt.status == Some(U64::one()),
        })
    }
}
