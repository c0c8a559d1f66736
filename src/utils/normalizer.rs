//! Rebuilds the nested argument tree from the flat list of form fields, and
//! the other way round.

use alloy::primitives::map::HashMap;

use super::type_matcher::{ParamShape, ShapedParam};
use crate::{
    elements::arg_path::{ArgPath, FlatArgument, PathSegment},
    error::{ComposeError, Result},
};

/// Raw user text arranged in the shape of the parameter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    /// Text of one form field. Scalar arrays are a single comma separated field.
    Leaf(String),
    Tuple(Vec<RawArg>),
    /// Elements of a tuple array.
    List(Vec<RawArg>),
}

/// A leaf the form has to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub path: ArgPath,
    pub ty: String,
}

struct ArgLookup<'a> {
    by_path: HashMap<&'a ArgPath, &'a str>,
}

impl<'a> ArgLookup<'a> {
    fn new(args: &'a [FlatArgument]) -> Result<Self> {
        let mut by_path = HashMap::default();
        for arg in args {
            if by_path.insert(&arg.path, arg.raw_value.as_str()).is_some() {
                return Err(ComposeError::DuplicateArgument {
                    path: arg.path.clone(),
                });
            }
        }
        Ok(Self { by_path })
    }

    fn leaf(&self, path: &ArgPath) -> Result<RawArg> {
        self.by_path
            .get(path)
            .map(|value| RawArg::Leaf(value.to_string()))
            .ok_or_else(|| ComposeError::MissingArgument { path: path.clone() })
    }

    fn has_descendant(&self, ancestor: &ArgPath) -> bool {
        self.by_path.keys().any(|path| path.starts_with(ancestor))
    }

    /// Whether an argument sits under an element of `array` at `count` or later.
    fn has_index_from(&self, array: &ArgPath, count: usize) -> bool {
        let depth = array.segments().len();
        self.by_path.keys().any(|path| {
            path.starts_with(array)
                && matches!(path.segments().get(depth), Some(PathSegment::Index(i)) if *i >= count)
        })
    }
}

/// First leaf, in declaration order, below `parent`.
fn first_leaf(fields: &[ShapedParam], parent: &ArgPath) -> ArgPath {
    let Some(field) = fields.first() else {
        return parent.clone();
    };
    let path = parent.param(&field.name, 0);
    match &field.shape {
        ParamShape::Tuple { fields } => first_leaf(fields, &path),
        ParamShape::Array { of, .. } => match of.as_ref() {
            ParamShape::Tuple { fields } => first_leaf(fields, &path.index(0)),
            _ => path,
        },
        ParamShape::Scalar { .. } => path,
    }
}

/// Matches every leaf of `params` with the argument of exactly the same path.
pub fn normalize(params: &[ShapedParam], args: &[FlatArgument]) -> Result<Vec<RawArg>> {
    let lookup = ArgLookup::new(args)?;
    normalize_fields(params, &ArgPath::root(), &lookup)
}

fn normalize_fields(
    params: &[ShapedParam],
    parent: &ArgPath,
    lookup: &ArgLookup<'_>,
) -> Result<Vec<RawArg>> {
    params
        .iter()
        .enumerate()
        .map(|(position, param)| {
            normalize_shape(&param.shape, &parent.param(&param.name, position), lookup)
        })
        .collect()
}

fn normalize_shape(shape: &ParamShape, path: &ArgPath, lookup: &ArgLookup<'_>) -> Result<RawArg> {
    match shape {
        ParamShape::Scalar { .. } => lookup.leaf(path),
        ParamShape::Tuple { fields } => Ok(RawArg::Tuple(normalize_fields(fields, path, lookup)?)),
        ParamShape::Array { of, length } => match of.as_ref() {
            ParamShape::Tuple { fields } => {
                let count = match length {
                    Some(length) => *length,
                    // Dynamic tuple arrays have as many rows as the form submitted.
                    None => (0..)
                        .take_while(|i| lookup.has_descendant(&path.index(*i)))
                        .count(),
                };
                if length.is_none() && lookup.has_index_from(path, count) {
                    // Row indices must be contiguous from zero.
                    return Err(ComposeError::MissingArgument {
                        path: first_leaf(fields, &path.index(count)),
                    });
                }
                let elements = (0..count)
                    .map(|i| -> Result<RawArg> {
                        Ok(RawArg::Tuple(normalize_fields(fields, &path.index(i), lookup)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(RawArg::List(elements))
            }
            _ => lookup.leaf(path),
        },
    }
}

/// Inverse of [`normalize`]: lists the arguments a tree was built from, in
/// declaration order.
pub fn flatten(params: &[ShapedParam], tree: &[RawArg]) -> Vec<FlatArgument> {
    let mut out = vec![];
    flatten_fields(params, tree, &ArgPath::root(), &mut out);
    out
}

fn flatten_fields(
    params: &[ShapedParam],
    tree: &[RawArg],
    parent: &ArgPath,
    out: &mut Vec<FlatArgument>,
) {
    for (position, (param, arg)) in params.iter().zip(tree).enumerate() {
        flatten_arg(&param.shape, arg, &parent.param(&param.name, position), out);
    }
}

fn flatten_arg(shape: &ParamShape, arg: &RawArg, path: &ArgPath, out: &mut Vec<FlatArgument>) {
    match (shape, arg) {
        (_, RawArg::Leaf(value)) => out.push(FlatArgument::new(path.clone(), value.clone())),
        (ParamShape::Tuple { fields }, RawArg::Tuple(children)) => {
            flatten_fields(fields, children, path, out)
        }
        (ParamShape::Array { of, .. }, RawArg::List(elements)) => {
            if let ParamShape::Tuple { fields } = of.as_ref() {
                for (i, element) in elements.iter().enumerate() {
                    if let RawArg::Tuple(children) = element {
                        flatten_fields(fields, children, &path.index(i), out);
                    }
                }
            }
        }
        // A tree not produced by `normalize` for these params; nothing to emit.
        _ => {}
    }
}

/// Leaf fields a form has to show for `params`. `rows` gives the number of
/// elements to lay out for each dynamic tuple array.
pub fn form_fields(
    params: &[ShapedParam],
    mut rows: impl FnMut(&ArgPath) -> usize,
) -> Vec<FormField> {
    let mut out = vec![];
    collect_fields(params, &ArgPath::root(), &mut rows, &mut out);
    out
}

fn collect_fields(
    params: &[ShapedParam],
    parent: &ArgPath,
    rows: &mut impl FnMut(&ArgPath) -> usize,
    out: &mut Vec<FormField>,
) {
    for (position, param) in params.iter().enumerate() {
        let path = parent.param(&param.name, position);
        match &param.shape {
            ParamShape::Tuple { fields } => collect_fields(fields, &path, rows, out),
            ParamShape::Array { of, length } => match of.as_ref() {
                ParamShape::Tuple { fields } => {
                    let count = length.unwrap_or_else(|| rows(&path));
                    for i in 0..count {
                        collect_fields(fields, &path.index(i), rows, out);
                    }
                }
                _ => out.push(FormField {
                    path,
                    ty: param.ty.clone(),
                }),
            },
            ParamShape::Scalar { .. } => out.push(FormField {
                path,
                ty: param.ty.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{elements::abi::AbiParameter, utils::type_matcher::shape_params};
    use proptest::prelude::*;

    fn order_params() -> Vec<ShapedParam> {
        shape_params(&[
            AbiParameter::new("recipient", "address"),
            AbiParameter::tuple(
                "terms",
                "tuple",
                vec![
                    AbiParameter::new("amount", "uint256"),
                    AbiParameter::new("ids", "uint256[]"),
                ],
            ),
            AbiParameter::tuple(
                "legs",
                "tuple[]",
                vec![
                    AbiParameter::new("token", "address"),
                    AbiParameter::new("share", "uint16"),
                ],
            ),
            AbiParameter::tuple("pair", "tuple[2]", vec![AbiParameter::new("flag", "bool")]),
            AbiParameter::new("", "bytes"),
        ])
        .unwrap()
    }

    fn arg(path: &str, value: &str) -> FlatArgument {
        FlatArgument::new(path.parse().unwrap(), value)
    }

    fn leaf(value: &str) -> RawArg {
        RawArg::Leaf(value.to_string())
    }

    #[test]
    fn rebuilds_nested_tree() {
        let args = vec![
            arg("pair[1].flag", "false"),
            arg("recipient", "0xabc"),
            arg("terms.amount", "100"),
            arg("terms.ids", "1, 2"),
            arg("legs[0].token", "0xdef"),
            arg("legs[0].share", "60"),
            arg("legs[1].token", "0x123"),
            arg("legs[1].share", "40"),
            arg("pair[0].flag", "true"),
            arg("#4", "0x"),
        ];

        let tree = normalize(&order_params(), &args).unwrap();
        assert_eq!(
            tree,
            vec![
                leaf("0xabc"),
                RawArg::Tuple(vec![leaf("100"), leaf("1, 2")]),
                RawArg::List(vec![
                    RawArg::Tuple(vec![leaf("0xdef"), leaf("60")]),
                    RawArg::Tuple(vec![leaf("0x123"), leaf("40")]),
                ]),
                RawArg::List(vec![
                    RawArg::Tuple(vec![leaf("true")]),
                    RawArg::Tuple(vec![leaf("false")]),
                ]),
                leaf("0x"),
            ]
        );
    }

    #[test]
    fn reports_exact_missing_path() {
        let args = vec![
            arg("recipient", "0xabc"),
            arg("terms.amount", "100"),
            arg("pair[0].flag", "true"),
            arg("pair[1].flag", "true"),
            arg("#4", "0x"),
        ];
        match normalize(&order_params(), &args) {
            Err(ComposeError::MissingArgument { path }) => assert_eq!(path.to_string(), "terms.ids"),
            other => panic!("expected a missing argument, got {other:?}"),
        }
    }

    #[test]
    fn gap_in_tuple_array_rows_is_reported() {
        let args = vec![
            arg("recipient", "0xabc"),
            arg("terms.amount", "100"),
            arg("terms.ids", "1"),
            arg("legs[0].token", "0xdef"),
            arg("legs[0].share", "60"),
            arg("legs[2].token", "0x123"),
            arg("legs[2].share", "40"),
            arg("pair[0].flag", "true"),
            arg("pair[1].flag", "true"),
            arg("#4", "0x"),
        ];
        match normalize(&order_params(), &args) {
            Err(ComposeError::MissingArgument { path }) => {
                assert_eq!(path.to_string(), "legs[1].token")
            }
            other => panic!("expected a missing argument, got {other:?}"),
        }
    }

    #[test]
    fn matching_is_exact_not_prefix() {
        let params = shape_params(&[AbiParameter::new("amount", "uint256")]).unwrap();
        let args = vec![arg("amountWei", "1")];
        assert!(matches!(
            normalize(&params, &args),
            Err(ComposeError::MissingArgument { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_paths() {
        let params = shape_params(&[AbiParameter::new("amount", "uint256")]).unwrap();
        let args = vec![arg("amount", "1"), arg("amount", "2")];
        assert!(matches!(
            normalize(&params, &args),
            Err(ComposeError::DuplicateArgument { .. })
        ));
    }

    #[test]
    fn form_fields_lay_out_rows() {
        let fields = form_fields(&order_params(), |path: &ArgPath| {
            assert_eq!(path.to_string(), "legs");
            1
        });
        let names: Vec<_> = fields.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(
            names,
            [
                "recipient",
                "terms.amount",
                "terms.ids",
                "legs[0].token",
                "legs[0].share",
                "pair[0].flag",
                "pair[1].flag",
                "#4",
            ]
        );
        assert_eq!(fields[2].ty, "uint256[]");
    }

    fn text() -> impl Strategy<Value = String> {
        "[ -~]{0,12}"
    }

    fn order_tree() -> impl Strategy<Value = Vec<RawArg>> {
        (
            text(),
            (text(), text()),
            proptest::collection::vec((text(), text()), 0..4),
            (text(), text()),
            text(),
        )
            .prop_map(|(recipient, (amount, ids), legs, (first, second), data)| {
                vec![
                    RawArg::Leaf(recipient),
                    RawArg::Tuple(vec![RawArg::Leaf(amount), RawArg::Leaf(ids)]),
                    RawArg::List(
                        legs.into_iter()
                            .map(|(token, share)| {
                                RawArg::Tuple(vec![RawArg::Leaf(token), RawArg::Leaf(share)])
                            })
                            .collect(),
                    ),
                    RawArg::List(vec![
                        RawArg::Tuple(vec![RawArg::Leaf(first)]),
                        RawArg::Tuple(vec![RawArg::Leaf(second)]),
                    ]),
                    RawArg::Leaf(data),
                ]
            })
    }

    proptest! {
        #[test]
        fn normalize_then_flatten_round_trips(tree in order_tree()) {
            let params = order_params();
            let args = flatten(&params, &tree);

            let rebuilt = normalize(&params, &args).unwrap();
            prop_assert_eq!(&rebuilt, &tree);
            prop_assert_eq!(flatten(&params, &rebuilt), args);
        }
    }
}
