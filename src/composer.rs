use std::borrow::Cow;

use alloy::{
    hex,
    primitives::{utils::parse_ether, U256},
};
use log::{debug, error, info};

use crate::{
    elements::{
        abi::{AbiFunction, ContractAbi, ContractRegistry, KnownContract},
        draft::TransactionDraft,
        transaction::{ComposedTransaction, ARBITRARY_CALL_SIGNATURE},
    },
    error::{ComposeError, Result},
    utils::{
        coercer::coerce_all,
        encoder::AbiEncoder,
        name_resolver::{parse_address, NameResolver},
        normalizer::normalize,
        type_matcher::shape_params,
    },
};

/// Collaborators a composition runs against. Holds no per-draft state.
pub struct ComposeContext<E, R> {
    pub registry: ContractRegistry,
    pub encoder: E,
    pub resolver: R,
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Parses an ether amount as typed into wei. Blank means zero.
pub fn parse_value(value: Option<&str>) -> Result<U256> {
    match non_blank(value) {
        None => Ok(U256::ZERO),
        Some(value) => parse_ether(value.trim()).map_err(|e| ComposeError::InvalidValue {
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

impl<E: AbiEncoder, R: NameResolver> ComposeContext<E, R> {
    pub fn new(registry: ContractRegistry, encoder: E, resolver: R) -> Self {
        Self {
            registry,
            encoder,
            resolver,
        }
    }

    /// The contract named by the draft, or, when the draft names none and
    /// pastes no ABI, the registered contract at its literal target address.
    fn known_contract(&self, draft: &TransactionDraft) -> Result<Option<&KnownContract>> {
        match non_blank(draft.contract.as_deref()) {
            None if non_blank(draft.custom_abi.as_deref()).is_none() => Ok(
                parse_address(&draft.address).and_then(|address| self.registry.by_address(&address)),
            ),
            None => Ok(None),
            Some(name) => self
                .registry
                .by_name(name)
                .map(Some)
                .ok_or_else(|| ComposeError::UnknownContract(name.to_string())),
        }
    }

    /// The known contract's ABI if one is selected, otherwise the pasted one.
    fn abi<'a>(&'a self, draft: &TransactionDraft) -> Result<Option<Cow<'a, ContractAbi>>> {
        if let Some(contract) = self.known_contract(draft)? {
            return Ok(Some(Cow::Borrowed(&contract.abi)));
        }
        match non_blank(draft.custom_abi.as_deref()) {
            Some(text) => Ok(Some(Cow::Owned(ContractAbi::parse_custom(text)?))),
            None => Ok(None),
        }
    }

    fn selected_function<'a>(
        &self,
        draft: &'a TransactionDraft,
        abi: &'a ContractAbi,
    ) -> Result<Option<&'a AbiFunction>> {
        let Some(function) = &draft.function else {
            return Ok(None);
        };
        function.lookup(abi).map(Some).ok_or_else(|| {
            ComposeError::CalldataEncoding(format!(
                "function `{}` not found in ABI",
                function.name()
            ))
        })
    }

    /// Calldata for `draft`.
    ///
    /// A non-blank raw override is returned verbatim. Otherwise the selected
    /// function is encoded from the form arguments. `None` means neither is
    /// available.
    pub fn calldata(&self, draft: &TransactionDraft) -> Result<Option<String>> {
        if let Some(raw) = non_blank(draft.raw_calldata.as_deref()) {
            debug!("Using raw calldata override");
            return Ok(Some(raw.to_string()));
        }

        let Some(abi) = self.abi(draft)? else {
            return Ok(None);
        };
        let Some(function) = self.selected_function(draft, &abi)? else {
            return Ok(None);
        };

        let params = shape_params(&function.inputs)?;
        let tree = normalize(&params, &draft.arguments)?;
        let values = coerce_all(&params, &tree)?;
        let calldata = self.encoder.encode(function, &values)?;

        debug!("Encoded {} ({} bytes)", function.name, calldata.len());
        Ok(Some(hex::encode_prefixed(calldata)))
    }

    fn function_signature(&self, draft: &TransactionDraft) -> Result<String> {
        if let Some(contract) = self.known_contract(draft)? {
            if let Some(function) = self.selected_function(draft, &contract.abi)? {
                return Ok(function.signature());
            }
        }
        Ok(ARBITRARY_CALL_SIGNATURE.to_string())
    }

    /// Builds the transaction for one "add transaction" action.
    ///
    /// `Ok(None)` means there was nothing to add: no calldata, and not both an
    /// address and a value for a plain transfer. Failures are logged and
    /// returned; nothing partial is ever produced.
    pub async fn compose(&self, draft: &TransactionDraft) -> Result<Option<ComposedTransaction>> {
        let result = self.try_compose(draft).await;
        if let Err(e) = &result {
            error!("Cannot add transaction to {:?}: {}", draft.address, e);
        }
        result
    }

    async fn try_compose(&self, draft: &TransactionDraft) -> Result<Option<ComposedTransaction>> {
        let transaction = match self.calldata(draft)? {
            Some(calldata) => {
                let value = parse_value(draft.value.as_deref())?;
                let function_signature = self.function_signature(draft)?;
                let target = self.resolver.resolve(&draft.address).await?;
                ComposedTransaction {
                    target,
                    calldata,
                    value,
                    function_signature,
                }
            }
            None => {
                if non_blank(Some(&draft.address)).is_none()
                    || non_blank(draft.value.as_deref()).is_none()
                {
                    debug!("Draft has neither calldata nor a value transfer");
                    return Ok(None);
                }
                let value = parse_value(draft.value.as_deref())?;
                let target = self.resolver.resolve(&draft.address).await?;
                ComposedTransaction::send_eth(target, value)
            }
        };

        info!(
            "Composed {} to {}",
            transaction.function_signature,
            self.registry.name_or_unknown(&transaction.target)
        );
        Ok(Some(transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        elements::{
            abi::AbiParameter,
            arg_path::FlatArgument,
            draft::FunctionRef,
            transaction::SEND_ETH_SIGNATURE,
        },
        utils::{
            coercer::ArgValue,
            encoder::DynAbiEncoder,
            name_resolver::AddressOnlyResolver,
        },
    };
    use alloy::primitives::{Address, Bytes};

    const TRANSFER_ABI: &str = r#"[{"name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}]}]"#;

    struct FailingEncoder;

    impl AbiEncoder for FailingEncoder {
        fn encode(&self, _: &AbiFunction, _: &[ArgValue]) -> Result<Bytes> {
            Err(ComposeError::CalldataEncoding("rejected".to_string()))
        }
    }

    fn context() -> ComposeContext<DynAbiEncoder, AddressOnlyResolver> {
        ComposeContext::new(ContractRegistry::default(), DynAbiEncoder, AddressOnlyResolver)
    }

    fn transfer_draft(to: &str, amount: &str) -> TransactionDraft {
        TransactionDraft {
            address: Address::repeat_byte(0x99).to_string(),
            custom_abi: Some(TRANSFER_ABI.to_string()),
            function: Some(FunctionRef::Name("transfer".to_string())),
            arguments: vec![
                FlatArgument::new("to".parse().unwrap(), to),
                FlatArgument::new("amount".parse().unwrap(), amount),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn raw_override_wins() {
        let mut draft = transfer_draft("not even an address", "x");
        draft.raw_calldata = Some("0xdeadbeef".to_string());
        assert_eq!(context().calldata(&draft).unwrap().as_deref(), Some("0xdeadbeef"));
    }

    #[test]
    fn blank_raw_override_is_ignored() {
        let mut draft = transfer_draft(&Address::repeat_byte(1).to_string(), "1");
        draft.raw_calldata = Some("  ".to_string());
        let calldata = context().calldata(&draft).unwrap().unwrap();
        assert!(calldata.starts_with("0xa9059cbb"));
    }

    #[test]
    fn no_abi_or_no_function_means_no_calldata() {
        let mut draft = transfer_draft("", "");
        draft.custom_abi = None;
        assert_eq!(context().calldata(&draft).unwrap(), None);

        let mut draft = transfer_draft("", "");
        draft.function = None;
        assert_eq!(context().calldata(&draft).unwrap(), None);
    }

    #[test]
    fn missing_argument_surfaces() {
        let mut draft = transfer_draft("0x01", "1");
        draft.arguments.pop();
        assert!(matches!(
            context().calldata(&draft),
            Err(ComposeError::MissingArgument { .. })
        ));
    }

    #[test]
    fn invalid_custom_abi_surfaces() {
        let mut draft = transfer_draft("0x01", "1");
        draft.custom_abi = Some("{\"inputs\": []}".to_string());
        assert!(matches!(
            context().calldata(&draft),
            Err(ComposeError::InvalidAbiJson(_))
        ));
    }

    #[test]
    fn unknown_contract_surfaces() {
        let mut draft = transfer_draft("0x01", "1");
        draft.contract = Some("auction".to_string());
        assert!(matches!(
            context().calldata(&draft),
            Err(ComposeError::UnknownContract(_))
        ));
    }

    #[tokio::test]
    async fn send_eth_fallback() {
        let target = Address::repeat_byte(0x05);
        let draft = TransactionDraft {
            address: target.to_string(),
            value: Some("1.5".to_string()),
            ..Default::default()
        };

        let transaction = context().compose(&draft).await.unwrap().unwrap();
        assert_eq!(transaction.function_signature, SEND_ETH_SIGNATURE);
        assert_eq!(transaction.calldata, "0x");
        assert_eq!(transaction.target, target);
        assert_eq!(transaction.value, U256::from(1_500_000_000_000_000_000u128));
    }

    #[tokio::test]
    async fn nothing_to_add() {
        let draft = TransactionDraft {
            address: Address::repeat_byte(0x05).to_string(),
            ..Default::default()
        };
        assert_eq!(context().compose(&draft).await.unwrap(), None);
    }

    #[tokio::test]
    async fn encoder_failure_adds_nothing() {
        let context =
            ComposeContext::new(ContractRegistry::default(), FailingEncoder, AddressOnlyResolver);
        let mut draft = transfer_draft("0x01", "1");
        draft.value = Some("1".to_string());
        assert!(matches!(
            context.compose(&draft).await,
            Err(ComposeError::CalldataEncoding(_))
        ));
    }

    #[tokio::test]
    async fn custom_abi_records_arbitrary_call() {
        let draft = transfer_draft(&Address::repeat_byte(1).to_string(), "100");
        let transaction = context().compose(&draft).await.unwrap().unwrap();
        assert_eq!(transaction.function_signature, ARBITRARY_CALL_SIGNATURE);
        assert_eq!(transaction.value, U256::ZERO);
    }

    #[tokio::test]
    async fn known_contract_records_function_signature() {
        let token = Address::repeat_byte(0x77);
        let mut registry = ContractRegistry::default();
        registry.add_contract(KnownContract {
            name: "token".to_string(),
            address: token,
            abi: ContractAbi::new(vec![AbiFunction::new(
                "transfer",
                vec![
                    AbiParameter::new("to", "address"),
                    AbiParameter::new("amount", "uint256"),
                ],
            )]),
        });
        let context = ComposeContext::new(registry, DynAbiEncoder, AddressOnlyResolver);

        let mut draft = transfer_draft(&Address::repeat_byte(1).to_string(), "100");
        draft.custom_abi = None;
        draft.contract = Some("token".to_string());
        draft.address = token.to_string();

        let transaction = context.compose(&draft).await.unwrap().unwrap();
        assert_eq!(transaction.function_signature, "transfer(address,uint256)");
        assert_eq!(transaction.target, token);
    }

    #[tokio::test]
    async fn invalid_value_is_rejected() {
        let draft = TransactionDraft {
            address: Address::repeat_byte(0x05).to_string(),
            value: Some("lots".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            context().compose(&draft).await,
            Err(ComposeError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn blank_address_with_bad_value_adds_nothing() {
        let draft = TransactionDraft {
            value: Some("lots".to_string()),
            ..Default::default()
        };
        assert_eq!(context().compose(&draft).await.unwrap(), None);
    }

    #[tokio::test]
    async fn selected_overload_is_the_one_encoded() {
        let overloads = r#"[
            {"name":"foo","inputs":[{"name":"amount","type":"uint256"}]},
            {"name":"foo","inputs":[{"name":"target","type":"address"}]}
        ]"#;
        let target = Address::repeat_byte(0x42);
        let selected = AbiFunction::new("foo", vec![AbiParameter::new("target", "address")]);
        let draft = TransactionDraft {
            address: Address::repeat_byte(0x99).to_string(),
            custom_abi: Some(overloads.to_string()),
            function: Some(FunctionRef::Item(selected.clone())),
            arguments: vec![FlatArgument::new("target".parse().unwrap(), target.to_string())],
            ..Default::default()
        };

        let calldata = context().calldata(&draft).unwrap().unwrap();
        let selector = hex::encode_prefixed(&selected.to_json_function().selector()[..]);
        assert!(calldata.starts_with(&selector));

        let by_signature = TransactionDraft {
            function: Some(FunctionRef::Name("foo(address)".to_string())),
            ..draft
        };
        assert_eq!(context().calldata(&by_signature).unwrap().unwrap(), calldata);
    }

    #[tokio::test]
    async fn registered_target_address_selects_known_contract() {
        let token = Address::repeat_byte(0x77);
        let mut registry = ContractRegistry::default();
        registry.add_contract(KnownContract {
            name: "token".to_string(),
            address: token,
            abi: ContractAbi::parse_custom(TRANSFER_ABI).unwrap(),
        });
        let context = ComposeContext::new(registry, DynAbiEncoder, AddressOnlyResolver);

        let mut draft = transfer_draft(&Address::repeat_byte(1).to_string(), "100");
        draft.custom_abi = None;
        draft.address = token.to_string();

        let transaction = context.compose(&draft).await.unwrap().unwrap();
        assert_eq!(transaction.function_signature, "transfer(address,uint256)");
    }
}
