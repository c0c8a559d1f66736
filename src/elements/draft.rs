use serde::Deserialize;

use super::{
    abi::{AbiFunction, ContractAbi},
    arg_path::FlatArgument,
};

/// The function a draft calls: either the full ABI item picked in the form,
/// or its name or signature, looked up in whichever ABI the draft resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FunctionRef {
    Name(String),
    Item(AbiFunction),
}

impl FunctionRef {
    pub fn name(&self) -> &str {
        match self {
            FunctionRef::Name(name) => name,
            FunctionRef::Item(function) => &function.name,
        }
    }

    /// The ABI item this reference denotes, if `abi` declares it.
    pub fn lookup<'a>(&'a self, abi: &'a ContractAbi) -> Option<&'a AbiFunction> {
        match self {
            FunctionRef::Item(function) => Some(function),
            FunctionRef::Name(name) => abi.function(name),
        }
    }
}

/// Everything the "add transaction" form collected for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionDraft {
    /// Target address or a name to resolve.
    #[serde(default)]
    pub address: String,
    /// Ether to send, as typed (e.g. `0.5`).
    #[serde(default)]
    pub value: Option<String>,
    /// Name of a known contract whose ABI to use.
    #[serde(default)]
    pub contract: Option<String>,
    /// ABI JSON pasted by the user, used when no known contract is selected.
    #[serde(default)]
    pub custom_abi: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionRef>,
    #[serde(default)]
    pub arguments: Vec<FlatArgument>,
    /// Hex pasted directly; overrides everything ABI related.
    #[serde(default)]
    pub raw_calldata: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}
