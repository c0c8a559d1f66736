use alloy::{
    json_abi::{Function, Param, StateMutability},
    primitives::{map::HashMap, Address},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ComposeError, Result};

/// A node of an ABI function's input tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParameter>,
}

impl AbiParameter {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            components: vec![],
        }
    }

    pub fn tuple(name: &str, ty: &str, components: Vec<AbiParameter>) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            components,
        }
    }

    pub(crate) fn to_json_param(&self) -> Param {
        Param {
            ty: self.ty.clone(),
            name: self.name.clone(),
            components: self.components.iter().map(Self::to_json_param).collect(),
            internal_type: None,
        }
    }
}

fn default_mutability() -> StateMutability {
    StateMutability::NonPayable
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    #[serde(default)]
    pub outputs: Vec<AbiParameter>,
    #[serde(rename = "stateMutability", default = "default_mutability")]
    pub state_mutability: StateMutability,
}

impl AbiFunction {
    pub fn new(name: &str, inputs: Vec<AbiParameter>) -> Self {
        Self {
            name: name.to_string(),
            inputs,
            outputs: vec![],
            state_mutability: default_mutability(),
        }
    }

    pub(crate) fn to_json_function(&self) -> Function {
        Function {
            name: self.name.clone(),
            inputs: self.inputs.iter().map(AbiParameter::to_json_param).collect(),
            outputs: self.outputs.iter().map(AbiParameter::to_json_param).collect(),
            state_mutability: self.state_mutability,
        }
    }

    /// Canonical `name(type,...)` form, tuples expanded.
    pub fn signature(&self) -> String {
        self.to_json_function().signature()
    }
}

/// The function items of a contract ABI. Events, errors and the constructor
/// are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAbi {
    pub functions: Vec<AbiFunction>,
}

impl ContractAbi {
    pub fn new(functions: Vec<AbiFunction>) -> Self {
        Self { functions }
    }

    /// Parses ABI JSON pasted by a user.
    ///
    /// Accepted input is an array whose first element has an `inputs`
    /// property; anything else is rejected before it can reach composition.
    pub fn parse_custom(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ComposeError::InvalidAbiJson(format!("not valid JSON: {e}")))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(ComposeError::InvalidAbiJson(
                "expected a JSON array".to_string(),
            ));
        };

        let has_inputs = items
            .first()
            .and_then(|first| first.get("inputs"))
            .is_some_and(|inputs| !matches!(inputs, Value::Null | Value::Bool(false)));
        if !has_inputs {
            return Err(ComposeError::InvalidAbiJson(
                "first ABI item has no `inputs`".to_string(),
            ));
        }

        let mut functions = vec![];
        for item in items {
            // Items without a `type` are functions.
            let kind = item.get("type").and_then(Value::as_str).unwrap_or("function");
            if kind != "function" {
                continue;
            }
            let function: AbiFunction = serde_json::from_value(item)
                .map_err(|e| ComposeError::InvalidAbiJson(e.to_string()))?;
            functions.push(function);
        }

        Ok(Self { functions })
    }

    /// Looks a function up by bare name or by full signature.
    ///
    /// A bare name returns the first declared overload; a signature such as
    /// `mint(address,uint256)` pins one overload exactly.
    pub fn function(&self, name_or_signature: &str) -> Option<&AbiFunction> {
        if name_or_signature.contains('(') {
            self.functions
                .iter()
                .find(|f| f.signature() == name_or_signature)
        } else {
            self.functions.iter().find(|f| f.name == name_or_signature)
        }
    }
}

/// A contract belonging to the DAO whose ABI is known up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownContract {
    pub name: String,
    pub address: Address,
    pub abi: ContractAbi,
}

#[derive(Debug, Default)]
pub struct ContractRegistry {
    pub address_to_name: HashMap<Address, String>,
    pub contracts: HashMap<String, KnownContract>,
}

impl ContractRegistry {
    pub fn add_contract(&mut self, contract: KnownContract) {
        self.address_to_name
            .insert(contract.address, contract.name.clone());
        self.contracts.insert(contract.name.clone(), contract);
    }

    pub fn by_name(&self, name: &str) -> Option<&KnownContract> {
        self.contracts.get(name)
    }

    pub fn by_address(&self, address: &Address) -> Option<&KnownContract> {
        self.address_to_name
            .get(address)
            .and_then(|name| self.contracts.get(name))
    }

    pub fn name_or_unknown(&self, address: &Address) -> String {
        match self.address_to_name.get(address) {
            Some(name) => name.clone(),
            None => format!("Unknown {}", address),
        }
    }
}
