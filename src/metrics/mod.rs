use ::metrics::{counter, histogram};
use std::time::Duration;

use crate::types::RecipientStatus;

// Metrics for monitoring
const METRIC_TX_SUBMITTED: &str = "airdrop_tx_submitted_total";
const METRIC_TX_CONFIRMED: &str = "airdrop_tx_confirmed_total";
const METRIC_TX_FAILED: &str = "airdrop_tx_failed_total";
const METRIC_CONFIRMATION_TIME: &str = "airdrop_confirmation_seconds";
const METRIC_RECIPIENTS: &str = "airdrop_recipients_total";
const METRIC_RUNS: &str = "airdrop_runs_total";

/// Transaction kinds used as the `kind` label.
pub const KIND_APPROVE: &str = "approve";
pub const KIND_BATCH: &str = "batch";
pub const KIND_TOKEN_TRANSFER: &str = "token_transfer";
pub const KIND_NATIVE_TRANSFER: &str = "native_transfer";

pub fn tx_submitted(kind: &'static str) {
    counter!(METRIC_TX_SUBMITTED, 1, "kind" => kind);
}

pub fn tx_confirmed(kind: &'static str, elapsed: Duration) {
    counter!(METRIC_TX_CONFIRMED, 1, "kind" => kind);
    histogram!(METRIC_CONFIRMATION_TIME, elapsed.as_secs_f64(), "kind" => kind);
}

pub fn tx_failed(kind: &'static str) {
    counter!(METRIC_TX_FAILED, 1, "kind" => kind);
}

pub fn recipient_processed(status: RecipientStatus) {
    let status = match status {
        RecipientStatus::Success => "success",
        RecipientStatus::Failed => "failed",
    };
    counter!(METRIC_RECIPIENTS, 1, "status" => status);
}

pub fn run_finished(mode: &'static str, outcome: &'static str) {
    counter!(METRIC_RUNS, 1, "mode" => mode, "outcome" => outcome);
}
