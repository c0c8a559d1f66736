use thiserror::Error;

use crate::elements::arg_path::ArgPath;

pub type Result<T, E = ComposeError> = std::result::Result<T, E>;

/// Everything that can go wrong while turning a transaction draft into calldata.
///
/// All variants are local to one compose attempt. Nothing is retried; the
/// caller fixes the input and composes again.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A leaf parameter has no form argument. The form layer generates one
    /// field per leaf, so this is an internal consistency fault.
    #[error("cannot build transaction: no argument for `{path}`")]
    MissingArgument { path: ArgPath },

    #[error("cannot build transaction: argument `{path}` given more than once")]
    DuplicateArgument { path: ArgPath },

    #[error("unsupported ABI type `{ty}`")]
    UnsupportedType { ty: String },

    #[error("malformed ABI parameter `{name}`: {reason}")]
    MalformedParameter { name: String, reason: String },

    #[error("failed to encode calldata: {0}")]
    CalldataEncoding(String),

    #[error("invalid ABI: {0}")]
    InvalidAbiJson(String),

    #[error("invalid argument path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("could not resolve `{name}`: {reason}")]
    NameResolution { name: String, reason: String },

    #[error("invalid value `{value}`: {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("invalid calldata `{calldata}`: {reason}")]
    InvalidCalldata { calldata: String, reason: String },

    #[error("unknown contract `{0}`")]
    UnknownContract(String),
}
