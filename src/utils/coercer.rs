use log::warn;

use super::{
    normalizer::RawArg,
    type_matcher::{ParamShape, ShapedParam},
};
use crate::error::{ComposeError, Result};

/// A value shaped for the ABI encoder. Leaves are still text: parsing numbers,
/// addresses and booleans is the encoder's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Scalar(String),
    Array(Vec<ArgValue>),
    Tuple(Vec<ArgValue>),
}

/// Removes every whitespace character, then splits on commas.
///
/// Whitespace inside an element is dropped too, so `"a b,c"` becomes
/// `["ab", "c"]`. Harmless for numbers and addresses, lossy for string arrays.
pub fn split_array_input(raw: &str) -> Vec<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.split(',').map(str::to_string).collect()
}

pub fn coerce(param: &ShapedParam, raw: &RawArg) -> Result<ArgValue> {
    coerce_shape(&param.name, &param.shape, raw)
}

pub fn coerce_all(params: &[ShapedParam], tree: &[RawArg]) -> Result<Vec<ArgValue>> {
    params
        .iter()
        .zip(tree)
        .map(|(param, raw)| coerce(param, raw))
        .collect()
}

fn coerce_shape(name: &str, shape: &ParamShape, raw: &RawArg) -> Result<ArgValue> {
    match (shape, raw) {
        (ParamShape::Scalar { .. }, RawArg::Leaf(text)) => Ok(ArgValue::Scalar(text.trim().to_string())),
        (ParamShape::Array { of, length }, RawArg::Leaf(text))
            if matches!(**of, ParamShape::Scalar { .. }) =>
        {
            let elements = split_array_input(text);
            if let Some(length) = length {
                if elements.len() != *length {
                    // Left for the encoder to reject.
                    warn!(
                        "`{}` expects {} elements, got {}",
                        name,
                        length,
                        elements.len()
                    );
                }
            }
            Ok(ArgValue::Array(
                elements.into_iter().map(ArgValue::Scalar).collect(),
            ))
        }
        (ParamShape::Tuple { fields }, RawArg::Tuple(children)) => {
            Ok(ArgValue::Tuple(coerce_all(fields, children)?))
        }
        (ParamShape::Array { of, .. }, RawArg::List(elements)) => Ok(ArgValue::Array(
            elements
                .iter()
                .map(|element| coerce_shape(name, of, element))
                .collect::<Result<_>>()?,
        )),
        _ => Err(ComposeError::MalformedParameter {
            name: name.to_string(),
            reason: "argument does not match the parameter's shape".to_string(),
        }),
    }
}
