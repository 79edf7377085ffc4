//! In-memory ledger standing in for a node: one ERC-20, native balances and a
//! Multicall3 that executes `aggregate3Value` against both.

#![allow(dead_code)]

use airdrop_engine::{
    abi::{
        calldata, Aggregate3ValueCall, Aggregate3ValueReturn, AllowanceCall, AllowanceReturn, ApproveCall,
        ApproveReturn, BalanceOfCall, BalanceOfReturn, CallResult, DecimalsReturn, TransferCall,
        TransferFromCall, TransferFromReturn, TransferReturn, ERC20Calls,
    },
    chain::ChainClient,
    config::AirdropConfig,
    constants::multicall3_address,
    error::{AirdropError, Result},
    types::TxConfirmation,
};
use async_trait::async_trait;
use ethers::{
    abi::{encode, AbiDecode, Token},
    types::{Address, Bytes, H256, U256, U64},
    utils::id,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn setup() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn config(mode: &str) -> AirdropConfig {
    let vars: HashMap<&str, &str> = [("PRIVATE_KEY", KEY), ("AIRDROP_MODE", mode)].into_iter().collect();
    AirdropConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn milli_ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(15)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub tx_hash: H256,
    pub target: Address,
    pub value: U256,
    pub selector: Option<[u8; 4]>,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    token_balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    native: HashMap<Address, U256>,
    receipts: HashMap<H256, (u64, bool)>,
    submissions: Vec<Submission>,
    block: u64,
}

pub struct FakeChain {
    pub sender: Address,
    pub token: Address,
    pub multicall: Address,
    decimals: u8,
    rejecting: Mutex<HashSet<Address>>,
    ledger: Mutex<Ledger>,
}

fn selector(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).map(|s| [s[0], s[1], s[2], s[3]])
}

/// `Error(string)` revert payload, as Solidity's `require` produces.
pub fn error_string(reason: &str) -> Bytes {
    let mut data = id("Error(string)").to_vec();
    data.extend(encode(&[Token::String(reason.to_string())]));
    data.into()
}

impl FakeChain {
    pub fn new(decimals: u8) -> Self {
        Self {
            sender: Address::repeat_byte(0x5e),
            token: Address::repeat_byte(0x70),
            multicall: multicall3_address(),
            decimals,
            rejecting: Mutex::new(HashSet::new()),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn fund_token(self, owner: Address, amount: U256) -> Self {
        self.ledger.lock().unwrap().token_balances.insert(owner, amount);
        self
    }

    pub fn fund_native(self, owner: Address, amount: U256) -> Self {
        self.ledger.lock().unwrap().native.insert(owner, amount);
        self
    }

    pub fn approve(self, spender: Address, amount: U256) -> Self {
        let owner = self.sender;
        self.ledger.lock().unwrap().allowances.insert((owner, spender), amount);
        self
    }

    /// Every transfer of either asset to `recipient` reverts.
    pub fn reject(self, recipient: Address) -> Self {
        self.rejecting.lock().unwrap().insert(recipient);
        self
    }

    pub fn token_balance_of(&self, owner: Address) -> U256 {
        self.ledger.lock().unwrap().token_balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn native_balance_of(&self, owner: Address) -> U256 {
        self.ledger.lock().unwrap().native.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance_of(&self, owner: Address, spender: Address) -> U256 {
        self.ledger.lock().unwrap().allowances.get(&(owner, spender)).copied().unwrap_or_default()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.ledger.lock().unwrap().submissions.clone()
    }

    fn rejects(&self, to: Address) -> bool {
        self.rejecting.lock().unwrap().contains(&to)
    }

    fn move_token(&self, ledger: &mut Ledger, from: Address, to: Address, amount: U256) -> std::result::Result<(), String> {
        if self.rejects(to) {
            return Err("transfer to blocked address".to_string());
        }
        let balance = ledger.token_balances.get(&from).copied().unwrap_or_default();
        if balance < amount {
            return Err("ERC20: transfer amount exceeds balance".to_string());
        }
        ledger.token_balances.insert(from, balance - amount);
        *ledger.token_balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn move_native(&self, ledger: &mut Ledger, from: Address, to: Address, amount: U256) -> std::result::Result<(), String> {
        if self.rejects(to) {
            return Err("receiver rejected value".to_string());
        }
        let balance = ledger.native.get(&from).copied().unwrap_or_default();
        if balance < amount {
            return Err("insufficient funds".to_string());
        }
        ledger.native.insert(from, balance - amount);
        *ledger.native.entry(to).or_default() += amount;
        Ok(())
    }

    fn token_call(&self, ledger: &mut Ledger, caller: Address, data: &[u8]) -> std::result::Result<Bytes, String> {
        let call = ERC20Calls::decode(data).map_err(|e| format!("bad token call: {e}"))?;
        match call {
            ERC20Calls::Approve(ApproveCall { spender, amount }) => {
                ledger.allowances.insert((caller, spender), amount);
                Ok(calldata(ApproveReturn(true)))
            }
            ERC20Calls::Transfer(TransferCall { recipient, amount }) => {
                self.move_token(ledger, caller, recipient, amount)?;
                Ok(calldata(TransferReturn(true)))
            }
            ERC20Calls::TransferFrom(TransferFromCall { sender, recipient, amount }) => {
                let allowance = ledger.allowances.get(&(sender, caller)).copied().unwrap_or_default();
                if allowance < amount {
                    return Err("ERC20: insufficient allowance".to_string());
                }
                self.move_token(ledger, sender, recipient, amount)?;
                ledger.allowances.insert((sender, caller), allowance - amount);
                Ok(calldata(TransferFromReturn(true)))
            }
            other => Err(format!("{other:?} is not a write")),
        }
    }

    fn aggregate3_value(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        value: U256,
        data: &[u8],
    ) -> std::result::Result<Vec<CallResult>, String> {
        let Aggregate3ValueCall { calls } =
            Aggregate3ValueCall::decode(data).map_err(|e| format!("bad multicall: {e}"))?;

        self.move_native(ledger, caller, self.multicall, value)?;

        let mut attached = U256::zero();
        let mut results = Vec::new();
        for call in calls {
            attached += call.value;
            let outcome = if call.target == self.token {
                self.token_call(ledger, self.multicall, &call.call_data)
            } else {
                self.move_native(ledger, self.multicall, call.target, call.value)
                    .map(|_| Bytes::default())
            };
            match outcome {
                Ok(return_data) => results.push(CallResult { success: true, return_data }),
                Err(reason) if call.allow_failure => results.push(CallResult {
                    success: false,
                    return_data: error_string(&reason),
                }),
                Err(reason) => return Err(format!("Multicall3: call failed: {reason}")),
            }
        }
        if attached != value {
            return Err("Multicall3: value mismatch".to_string());
        }
        Ok(results)
    }

    fn execute(&self, ledger: &mut Ledger, target: Address, data: &[u8], value: U256) -> std::result::Result<Bytes, String> {
        let caller = self.sender;
        if target == self.multicall {
            let return_data = self.aggregate3_value(ledger, caller, value, data)?;
            Ok(calldata(Aggregate3ValueReturn { return_data: return_data.into_iter().map(|r| (r.success, r.return_data)).collect() }))
        } else if target == self.token && value.is_zero() {
            self.token_call(ledger, caller, data)
        } else {
            Err(format!("no contract at {target:?}"))
        }
    }

    /// Mine one transaction: state changes are kept only when it succeeds.
    fn mine(&self, target: Address, value: U256, data: Option<&[u8]>, run: impl FnOnce(&mut Ledger) -> std::result::Result<(), String>) -> H256 {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.block += 1;
        let block = ledger.block;
        let tx_hash = H256::from_low_u64_be(block);

        let mut scratch = ledger.clone();
        let succeeded = run(&mut scratch).is_ok();
        if succeeded {
            *ledger = scratch;
        }
        ledger.receipts.insert(tx_hash, (block, succeeded));
        ledger.submissions.push(Submission {
            tx_hash,
            target,
            value,
            selector: data.and_then(selector),
        });
        tx_hash
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn read_contract(&self, target: Address, data: Bytes) -> Result<Bytes> {
        let read_error = |reason: String| AirdropError::ChainRead { target, reason };
        if target != self.token {
            return Err(read_error("no contract code".to_string()));
        }
        let call = ERC20Calls::decode(&data).map_err(|e| read_error(e.to_string()))?;
        let ledger = self.ledger.lock().unwrap();
        match call {
            ERC20Calls::Decimals(_) => Ok(calldata(DecimalsReturn(self.decimals))),
            ERC20Calls::BalanceOf(BalanceOfCall { account }) => Ok(calldata(BalanceOfReturn(
                ledger.token_balances.get(&account).copied().unwrap_or_default(),
            ))),
            ERC20Calls::Allowance(AllowanceCall { owner, spender }) => Ok(calldata(AllowanceReturn(
                ledger.allowances.get(&(owner, spender)).copied().unwrap_or_default(),
            ))),
            _ => Err(read_error("execution reverted".to_string())),
        }
    }

    async fn simulate_contract_call(&self, target: Address, data: Bytes, value: U256) -> Result<Bytes> {
        let mut scratch = self.ledger.lock().unwrap().clone();
        self.execute(&mut scratch, target, &data, value)
            .map_err(|reason| AirdropError::SubmissionFailed(format!("simulation reverted: {reason}")))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.native_balance_of(owner))
    }

    async fn submit_contract_call(&self, target: Address, data: Bytes, value: U256) -> Result<H256> {
        Ok(self.mine(target, value, Some(data.as_ref()), |ledger| {
            self.execute(ledger, target, &data, value).map(|_| ())
        }))
    }

    async fn submit_value_transfer(&self, to: Address, value: U256) -> Result<H256> {
        let from = self.sender;
        Ok(self.mine(to, value, None, |ledger| self.move_native(ledger, from, to, value)))
    }

    async fn wait_for_confirmation(&self, tx_hash: H256) -> Result<TxConfirmation> {
        let ledger = self.ledger.lock().unwrap();
        match ledger.receipts.get(&tx_hash) {
            Some((block, succeeded)) => Ok(TxConfirmation {
                tx_hash,
                block_number: Some(U64::from(*block)),
                succeeded: *succeeded,
            }),
            None => Err(AirdropError::ConfirmationTimeout { tx_hash, waited: Duration::ZERO }),
        }
    }
}
