use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    primitives::Bytes,
};

use super::coercer::ArgValue;
use crate::{
    elements::abi::AbiFunction,
    error::{ComposeError, Result},
};

/// Turns a resolved ABI function plus shaped argument values into calldata.
pub trait AbiEncoder {
    fn encode(&self, function: &AbiFunction, args: &[ArgValue]) -> Result<Bytes>;
}

/// [`AbiEncoder`] backed by `alloy`'s dynamic ABI support.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynAbiEncoder;

fn encoding_error(message: impl ToString) -> ComposeError {
    ComposeError::CalldataEncoding(message.to_string())
}

/// Builds a [`DynSolValue`] for `ty`, parsing text leaves with `coerce_str`.
pub fn to_dyn_value(ty: &DynSolType, value: &ArgValue) -> Result<DynSolValue> {
    match (ty, value) {
        (DynSolType::Tuple(types), ArgValue::Tuple(values)) => {
            if types.len() != values.len() {
                return Err(encoding_error(format!(
                    "tuple requires {} elements, got {}",
                    types.len(),
                    values.len()
                )));
            }
            let inner = types
                .iter()
                .zip(values)
                .map(|(ty, value)| to_dyn_value(ty, value))
                .collect::<Result<_>>()?;
            Ok(DynSolValue::Tuple(inner))
        }
        (DynSolType::Array(inner), ArgValue::Array(values)) => Ok(DynSolValue::Array(
            values
                .iter()
                .map(|value| to_dyn_value(inner, value))
                .collect::<Result<_>>()?,
        )),
        (DynSolType::FixedArray(inner, _), ArgValue::Array(values)) => Ok(DynSolValue::FixedArray(
            values
                .iter()
                .map(|value| to_dyn_value(inner, value))
                .collect::<Result<_>>()?,
        )),
        (ty, ArgValue::Scalar(text)) => ty
            .coerce_str(text)
            .map_err(|e| encoding_error(format!("failed to coerce '{}' as {}: {}", text, ty, e))),
        (ty, value) => Err(encoding_error(format!(
            "value {:?} does not fit type {}",
            value, ty
        ))),
    }
}

impl AbiEncoder for DynAbiEncoder {
    fn encode(&self, function: &AbiFunction, args: &[ArgValue]) -> Result<Bytes> {
        let function = function.to_json_function();

        if function.inputs.len() != args.len() {
            return Err(encoding_error(format!(
                "argument count mismatch: `{}` has {} params, got {} args",
                function.signature(),
                function.inputs.len(),
                args.len()
            )));
        }

        let values = function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, value)| {
                let ty: DynSolType = param
                    .resolve()
                    .map_err(|e| encoding_error(format!("failed to resolve type '{}': {}", param.ty, e)))?;
                to_dyn_value(&ty, value)
            })
            .collect::<Result<Vec<_>>>()?;

        let calldata = function.abi_encode_input(&values).map_err(encoding_error)?;

        Ok(calldata.into())
    }
}
