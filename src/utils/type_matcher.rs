//! Classification of ABI type strings, and the parameter shapes derived from
//! them once per function so nothing downstream re-reads type strings.

use crate::{
    elements::abi::AbiParameter,
    error::{ComposeError, Result},
};

const TUPLE: &str = "tuple";

/// Structural facts about one ABI type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeClassification {
    pub base_type: String,
    pub is_array: bool,
    /// Present only for fixed-length arrays.
    pub array_length: Option<usize>,
}

/// Strips one `[]` or `[N]` suffix from `ty`.
///
/// Only one level of array is supported: a base type that is itself an array
/// is rejected rather than encoded wrongly.
pub fn classify(ty: &str) -> Result<TypeClassification> {
    let unsupported = || ComposeError::UnsupportedType { ty: ty.to_string() };

    let (base_type, is_array, array_length) = match ty.strip_suffix(']') {
        None => (ty, false, None),
        Some(head) => {
            let open = head.rfind('[').ok_or_else(unsupported)?;
            let digits = &head[open + 1..];
            let length = if digits.is_empty() {
                None
            } else if digits.bytes().all(|b| b.is_ascii_digit()) {
                Some(digits.parse::<usize>().map_err(|_| unsupported())?)
            } else {
                return Err(unsupported());
            };
            (&head[..open], true, length)
        }
    };

    if base_type.is_empty() || base_type.contains(['[', ']']) {
        return Err(unsupported());
    }

    Ok(TypeClassification {
        base_type: base_type.to_string(),
        is_array,
        array_length,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamShape {
    /// Any non-array, non-tuple type, e.g. `uint256` or `bytes`.
    Scalar { ty: String },
    /// `of` is never itself an array.
    Array {
        of: Box<ParamShape>,
        length: Option<usize>,
    },
    Tuple { fields: Vec<ShapedParam> },
}

impl ParamShape {
    pub fn is_tuple_array(&self) -> bool {
        matches!(self, ParamShape::Array { of, .. } if matches!(**of, ParamShape::Tuple { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedParam {
    pub name: String,
    /// Declared type string, kept for display.
    pub ty: String,
    pub shape: ParamShape,
}

fn malformed(param: &AbiParameter, reason: &str) -> ComposeError {
    ComposeError::MalformedParameter {
        name: param.name.clone(),
        reason: reason.to_string(),
    }
}

pub fn shape_param(param: &AbiParameter) -> Result<ShapedParam> {
    let classification = classify(&param.ty)?;

    let element = if classification.base_type == TUPLE {
        if param.components.is_empty() {
            return Err(malformed(param, "tuple type without components"));
        }
        ParamShape::Tuple {
            fields: shape_params(&param.components)?,
        }
    } else {
        if !param.components.is_empty() {
            return Err(malformed(param, "components on a non-tuple type"));
        }
        ParamShape::Scalar {
            ty: classification.base_type,
        }
    };

    let shape = if classification.is_array {
        ParamShape::Array {
            of: Box::new(element),
            length: classification.array_length,
        }
    } else {
        element
    };

    Ok(ShapedParam {
        name: param.name.clone(),
        ty: param.ty.clone(),
        shape,
    })
}

pub fn shape_params(params: &[AbiParameter]) -> Result<Vec<ShapedParam>> {
    params.iter().map(shape_param).collect()
}
