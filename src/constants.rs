use ethers::types::Address;
use std::time::Duration;

/// Native coin precision, fixed by the chain.
pub const NATIVE_DECIMALS: u8 = 18;

/// Highest precision `parse_units` can scale to without overflowing U256.
pub const MAX_DECIMALS: u8 = 77;

/// Canonical Multicall3 deployment, same address on every EVM chain it lives on.
pub const MULTICALL3_ADDRESS: &str = "0xcA11bde05977b3631167028862bE2a173976CA11";

pub const DEFAULT_RPC_URL: &str = "https://rpc.frax.com";
pub const DEFAULT_CHAIN_ID: u64 = 252; // Fraxtal

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

pub const PROJECT_NAME: &str = "airdrop_engine";

pub fn multicall3_address() -> Address {
    MULTICALL3_ADDRESS
        .parse()
        .unwrap_or_else(|_| Address::zero())
}
