use ethers::types::{Address, Bytes, U256};

use crate::abi::{aggregate3_value, calldata, TransferFromCall};
use crate::error::{AirdropError, Result};
use crate::reporter::ProgressReporter;
use crate::types::{AmountTotals, CallItem, ResolvedRecipient};
use crate::utils::{format_amount, format_native};

/// Ordered Multicall3 calls for one run plus the totals they were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub calls: Vec<CallItem>,
    pub totals: AmountTotals,
    /// Sum of the token amounts moved by `transferFrom` items.
    pub token_moved: U256,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn native_value(&self) -> Result<U256> {
        self.calls.iter().try_fold(U256::zero(), |acc, call| {
            acc.checked_add(call.value)
                .ok_or_else(|| AirdropError::PlanInvariant("native value overflows uint256".into()))
        })
    }

    /// Attached value and moved tokens must equal the precomputed totals.
    pub fn verify(&self) -> Result<()> {
        let native = self.native_value()?;
        if native != self.totals.total_native {
            return Err(AirdropError::PlanInvariant(format!(
                "call values sum to {native}, totals say {}",
                self.totals.total_native
            )));
        }
        if self.token_moved != self.totals.total_token {
            return Err(AirdropError::PlanInvariant(format!(
                "token moves sum to {}, totals say {}",
                self.token_moved, self.totals.total_token
            )));
        }
        Ok(())
    }

    /// Call data for `aggregate3Value` over every item.
    pub fn encode(&self) -> Bytes {
        aggregate3_value(&self.calls)
    }
}

/// Turn resolved recipients into call items in list order. Token moves are
/// `transferFrom(sender, recipient)` on the token, native moves are plain value
/// calls to the recipient. Zero amounts produce no item.
pub fn build_plan(
    token: Address,
    sender: Address,
    recipients: &[ResolvedRecipient],
    totals: AmountTotals,
    token_decimals: u8,
    reporter: &dyn ProgressReporter,
) -> Result<BatchPlan> {
    let mut calls = Vec::new();
    let mut token_moved = U256::zero();
    let count = recipients.len();

    for (position, recipient) in recipients.iter().enumerate() {
        if !recipient.has_transfers() {
            reporter.emit(format!(
                "[{}/{}] {:?} has nothing to receive, skipping",
                position + 1,
                count,
                recipient.address
            ));
            continue;
        }

        if !recipient.token_amount.is_zero() {
            calls.push(CallItem {
                target: token,
                allow_failure: true,
                value: U256::zero(),
                call_data: calldata(TransferFromCall {
                    sender,
                    recipient: recipient.address,
                    amount: recipient.token_amount,
                }),
            });
            token_moved = token_moved
                .checked_add(recipient.token_amount)
                .ok_or_else(|| AirdropError::PlanInvariant("token total overflows uint256".into()))?;
            reporter.emit(format!(
                "[{}/{}] Queued {} tokens for {:?}",
                position + 1,
                count,
                format_amount(recipient.token_amount, token_decimals),
                recipient.address
            ));
        }

        if !recipient.native_amount.is_zero() {
            calls.push(CallItem {
                target: recipient.address,
                allow_failure: true,
                value: recipient.native_amount,
                call_data: Bytes::default(),
            });
            reporter.emit(format!(
                "[{}/{}] Queued {} native for {:?}",
                position + 1,
                count,
                format_native(recipient.native_amount),
                recipient.address
            ));
        }
    }

    let plan = BatchPlan {
        calls,
        totals,
        token_moved,
    };
    plan.verify()?;
    Ok(plan)
}
