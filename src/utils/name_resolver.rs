use std::str::FromStr;

use alloy::{
    primitives::{address, keccak256, Address, FixedBytes},
    providers::{ProviderBuilder, RootProvider},
    sol,
    transports::http::Http,
};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::{ComposeError, Result};

sol! {
    #[sol(rpc)]
    contract EnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    contract AddrResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

/// ENS registry, same address on mainnet and the public testnets.
pub const ENS_REGISTRY_ADDRESS: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Resolves what a user typed as a target into an address.
#[async_trait]
pub trait NameResolver {
    async fn resolve(&self, name_or_address: &str) -> Result<Address>;
}

fn resolution_error(name: &str, reason: impl ToString) -> ComposeError {
    ComposeError::NameResolution {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

pub fn parse_address(input: &str) -> Option<Address> {
    Address::from_str(input.trim()).ok()
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> FixedBytes<32> {
    let mut node = FixedBytes::<32>::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

/// Accepts only address-shaped input. Used when no RPC endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressOnlyResolver;

#[async_trait]
impl NameResolver for AddressOnlyResolver {
    async fn resolve(&self, name_or_address: &str) -> Result<Address> {
        parse_address(name_or_address)
            .ok_or_else(|| resolution_error(name_or_address, "not an address and no resolver is configured"))
    }
}

pub struct EnsResolver {
    provider: RootProvider<Http<Client>>,
    registry: Address,
}

impl EnsResolver {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = rpc_url
            .parse::<reqwest::Url>()
            .map_err(|e| resolution_error(rpc_url, format!("invalid RPC url: {e}")))?;
        Ok(Self {
            provider: ProviderBuilder::new().on_http(url),
            registry: ENS_REGISTRY_ADDRESS,
        })
    }
}

#[async_trait]
impl NameResolver for EnsResolver {
    async fn resolve(&self, name_or_address: &str) -> Result<Address> {
        if let Some(address) = parse_address(name_or_address) {
            return Ok(address);
        }

        let name = name_or_address.trim().to_lowercase();
        if name.is_empty() {
            return Err(resolution_error(name_or_address, "empty name"));
        }
        let node = namehash(&name);

        let registry = EnsRegistry::new(self.registry, self.provider.clone());
        let resolver = registry
            .resolver(node)
            .call()
            .await
            .map_err(|e| resolution_error(&name, e))?
            ._0;
        if resolver == Address::ZERO {
            return Err(resolution_error(&name, "no resolver set"));
        }

        let address = AddrResolver::new(resolver, self.provider.clone())
            .addr(node)
            .call()
            .await
            .map_err(|e| resolution_error(&name, e))?
            ._0;
        if address == Address::ZERO {
            return Err(resolution_error(&name, "name has no address record"));
        }

        debug!("Resolved {} to {}", name, address);
        Ok(address)
    }
}
