use alloy::primitives::{Address, U256};
use serde::Serialize;

/// Signature recorded for a plain ether transfer.
pub const SEND_ETH_SIGNATURE: &str = "sendEth(address)";
/// Signature recorded for calldata built against an ABI that is not one of
/// the DAO's known contracts, or pasted by hand.
pub const ARBITRARY_CALL_SIGNATURE: &str = "call(address,calldata)";

/// A single call queued for a proposal. Built once per "add transaction"
/// action and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedTransaction {
    pub target: Address,
    /// Hex calldata, `0x`-prefixed unless a raw override was given differently.
    pub calldata: String,
    /// Amount of wei sent along with the call.
    pub value: U256,
    pub function_signature: String,
}

impl ComposedTransaction {
    pub fn send_eth(target: Address, value: U256) -> Self {
        Self {
            target,
            calldata: "0x".to_string(),
            value,
            function_signature: SEND_ETH_SIGNATURE.to_string(),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        if self.function_signature == SEND_ETH_SIGNATURE {
            TransactionKind::SendEth
        } else {
            TransactionKind::Custom
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    Custom,
    SendEth,
}

/// Transactions added to a proposal by one user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionGroup {
    pub kind: TransactionKind,
    pub summary: Option<String>,
    pub transactions: Vec<ComposedTransaction>,
}

impl TransactionGroup {
    pub fn single(transaction: ComposedTransaction, summary: Option<String>) -> Self {
        Self {
            kind: transaction.kind(),
            summary,
            transactions: vec![transaction],
        }
    }
}
