//! Typed bindings for the two contracts the engine talks to: the ERC-20 being
//! distributed and the Multicall3 batch executor.

use ethers::{
    abi::{decode, AbiDecode, AbiEncode, ParamType, Token},
    contract::abigen,
    types::Bytes,
};

use crate::error::{AirdropError, Result};
use crate::types::CallItem;

// Generate type-safe contract bindings
abigen!(
    ERC20,
    r#"[
        function decimals() external view returns (uint8)
        function balanceOf(address account) external view returns (uint256)
        function transfer(address recipient, uint256 amount) external returns (bool)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
        function transferFrom(address sender, address recipient, uint256 amount) external returns (bool)
    ]"#,
);

abigen!(
    Multicall3,
    r#"[
        struct Call3Value { address target; bool allowFailure; uint256 value; bytes callData; }
        struct CallResult { bool success; bytes returnData; }
        function aggregate3Value(Call3Value[] calls) external payable returns (CallResult[] returnData)
    ]"#,
);

/// Selector of the standard `Error(string)` revert payload.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Selector plus ABI-encoded arguments of a generated call.
pub fn calldata<C: AbiEncode>(call: C) -> Bytes {
    call.encode().into()
}

/// Decode the return data of a call into its generated `*Return` type.
pub fn decode_return<R: AbiDecode>(data: &[u8]) -> Result<R> {
    R::decode(data).map_err(|e| AirdropError::Encoding(format!("bad return data: {e}")))
}

impl From<&CallItem> for Call3Value {
    fn from(item: &CallItem) -> Self {
        Self {
            target: item.target,
            allow_failure: item.allow_failure,
            value: item.value,
            call_data: item.call_data.clone(),
        }
    }
}

/// `aggregate3Value` call data over `calls`, in order.
pub fn aggregate3_value(calls: &[CallItem]) -> Bytes {
    calldata(Aggregate3ValueCall {
        calls: calls.iter().map(Call3Value::from).collect(),
    })
}

/// Human readable reason from revert data: the `Error(string)` message when
/// present, otherwise the raw hex.
pub fn revert_reason(data: &[u8]) -> String {
    if data.is_empty() {
        return "reverted without reason".to_string();
    }
    if data.len() > 4 && data[..4] == ERROR_STRING_SELECTOR {
        if let Ok(tokens) = decode(&[ParamType::String], &data[4..]) {
            if let Some(Token::String(reason)) = tokens.into_iter().next() {
                return reason;
            }
        }
    }
    format!("0x{}", hex::encode(data))
}
