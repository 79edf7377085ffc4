pub mod abi;
pub mod aggregator;
pub mod authorization;
pub mod chain;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod plan;
pub mod recipients;
pub mod reporter;
pub mod types;
pub mod utils;

pub use chain::{ChainClient, EthersChainClient};
pub use config::{AirdropConfig, ExecutionMode};
pub use engine::AirdropEngine;
pub use error::{AirdropError, Result};
pub use reporter::{ProgressEvent, ProgressReporter, RunLog};
pub use types::{AirdropRequest, Recipient, RunOutcome};
