use alloy::{
    hex,
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

use super::transaction::{ComposedTransaction, TransactionGroup};
use crate::error::{ComposeError, Result};

sol! {
    function propose(
        address[] targets,
        uint256[] values,
        bytes[] calldatas,
        string description
    ) external returns (bytes32);
}

/// Ordered list of transaction groups drafted for one proposal.
///
/// Groups are only ever appended here; removal and reordering belong to
/// whoever edits the draft.
#[derive(Debug, Clone, Default)]
pub struct ProposalQueue {
    groups: Vec<TransactionGroup>,
}

impl ProposalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: TransactionGroup) {
        self.groups.push(group);
    }

    pub fn push_transaction(&mut self, transaction: ComposedTransaction, summary: Option<String>) {
        self.push(TransactionGroup::single(transaction, summary));
    }

    pub fn groups(&self) -> &[TransactionGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.transactions.is_empty())
    }

    /// Flattens every queued transaction into the parallel arrays a governor
    /// expects, keeping queue order.
    pub fn prepare(&self) -> ProposalTransactions {
        let mut prepared = ProposalTransactions::default();
        for transaction in self.groups.iter().flat_map(|g| &g.transactions) {
            prepared.targets.push(transaction.target);
            prepared.calldata.push(transaction.calldata.clone());
            prepared.values.push(transaction.value);
        }
        prepared
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalTransactions {
    pub targets: Vec<Address>,
    pub calldata: Vec<String>,
    pub values: Vec<U256>,
}

impl ProposalTransactions {
    /// ABI-encodes the governor `propose` call carrying these transactions.
    pub fn encode_propose(&self, description: &str) -> Result<Bytes> {
        let calldatas = self
            .calldata
            .iter()
            .map(|calldata| {
                hex::decode(calldata)
                    .map(Bytes::from)
                    .map_err(|e| ComposeError::InvalidCalldata {
                        calldata: calldata.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let call = proposeCall {
            targets: self.targets.clone(),
            values: self.values.clone(),
            calldatas,
            description: description.to_string(),
        };

        Ok(call.abi_encode().into())
    }
}
