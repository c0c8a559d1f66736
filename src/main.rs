use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    hex,
    primitives::{utils::format_ether, Address},
};
use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use serde::Deserialize;

use proposal_composer::{
    elements::abi::{ContractAbi, ContractRegistry, KnownContract},
    utils::{
        encoder::DynAbiEncoder,
        name_resolver::{AddressOnlyResolver, EnsResolver, NameResolver},
    },
    ComposeContext, ProposalQueue, TransactionDraft,
};

const DEFAULT_DESCRIPTION: &str = "Proposal";

#[derive(Debug, Parser)]
struct Args {
    // YAML (or JSON) file with the transactions to add to the proposal.
    #[clap(short, long)]
    proposal: PathBuf,

    // Known contracts: name, address and ABI (file path or inline JSON).
    #[clap(short, long)]
    contracts: Option<PathBuf>,

    // Without it only literal addresses are accepted as targets.
    #[clap(long)]
    rpc_url: Option<String>,

    #[clap(long)]
    display_propose_data: Option<bool>,

    // Overrides the description from the proposal file.
    #[clap(long)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProposalFile {
    #[serde(default)]
    description: Option<String>,
    transactions: Vec<TransactionDraft>,
}

#[derive(Debug, Deserialize)]
struct ContractEntry {
    name: String,
    address: Address,
    abi: String,
}

fn load_abi(abi: &str, base_dir: &Path) -> anyhow::Result<ContractAbi> {
    let text = if abi.trim_start().starts_with('[') {
        abi.to_string()
    } else {
        let path = base_dir.join(abi);
        fs::read_to_string(&path).with_context(|| format!("reading ABI {}", path.display()))?
    };
    Ok(ContractAbi::parse_custom(&text)?)
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<ContractRegistry> {
    let mut registry = ContractRegistry::default();
    let Some(path) = path else {
        return Ok(registry);
    };

    let yaml_content = fs::read_to_string(path)
        .with_context(|| format!("reading contracts file {}", path.display()))?;
    let entries: Vec<ContractEntry> = serde_yaml::from_str(&yaml_content)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    for entry in entries {
        let abi = load_abi(&entry.abi, base_dir)
            .with_context(|| format!("loading ABI of {}", entry.name))?;
        registry.add_contract(KnownContract {
            name: entry.name,
            address: entry.address,
            abi,
        });
    }
    Ok(registry)
}

async fn compose_all<R: NameResolver>(
    context: &ComposeContext<DynAbiEncoder, R>,
    drafts: &[TransactionDraft],
) -> (ProposalQueue, usize) {
    let mut queue = ProposalQueue::new();
    let mut failures = 0;

    for (i, draft) in drafts.iter().enumerate() {
        let label = draft.summary.as_deref().unwrap_or(&draft.address);
        match context.compose(draft).await {
            Ok(Some(transaction)) => {
                println!(
                    "{} #{} {} -> {} ({} ETH)",
                    "Added".green(),
                    i,
                    transaction.function_signature,
                    context.registry.name_or_unknown(&transaction.target),
                    format_ether(transaction.value)
                );
                queue.push_transaction(transaction, draft.summary.clone());
            }
            Ok(None) => {
                println!("{} #{} {}: nothing to add", "Skipped".yellow(), i, label);
            }
            Err(e) => {
                failures += 1;
                println!("{} #{} {}: {}", "Failed".red(), i, label, e);
            }
        }
    }
    (queue, failures)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::init();

    let yaml_content = fs::read_to_string(&args.proposal)
        .with_context(|| format!("reading proposal {}", args.proposal.display()))?;
    let proposal: ProposalFile = serde_yaml::from_str(&yaml_content)?;

    let registry = load_registry(args.contracts.as_deref())?;

    let (queue, failures) = match &args.rpc_url {
        Some(rpc_url) => {
            let context = ComposeContext::new(registry, DynAbiEncoder, EnsResolver::new(rpc_url)?);
            compose_all(&context, &proposal.transactions).await
        }
        None => {
            let context = ComposeContext::new(registry, DynAbiEncoder, AddressOnlyResolver);
            compose_all(&context, &proposal.transactions).await
        }
    };

    let prepared = queue.prepare();
    println!();
    println!("{}", "Proposal transactions".bold());
    println!("targets   = {:?}", prepared.targets);
    println!("values    = {:?}", prepared.values);
    println!("calldatas = {:?}", prepared.calldata);

    if failures > 0 {
        println!("{}", format!("{} transaction(s) could not be added", failures).red());
    }

    if args.display_propose_data.unwrap_or_default() {
        let description = args
            .description
            .or(proposal.description)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        println!(
            "Encoded propose data = {}",
            hex::encode_prefixed(prepared.encode_propose(&description)?)
        );
    }

    Ok(())
}
