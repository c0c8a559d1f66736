pub mod composer;
pub mod elements;
pub mod error;
pub mod utils;

pub use composer::ComposeContext;
pub use elements::{
    draft::{FunctionRef, TransactionDraft},
    proposal::{ProposalQueue, ProposalTransactions},
    transaction::ComposedTransaction,
};
pub use error::{ComposeError, Result};
