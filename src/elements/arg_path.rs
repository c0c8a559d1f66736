use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ComposeError;

/// One step from a parent node of the parameter tree to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named parameter or struct field.
    Field(String),
    /// Element of a tuple array.
    Index(usize),
    /// Unnamed parameter, addressed by its declared position.
    Position(usize),
}

/// Address of a node in a function's parameter tree, as a list of segments
/// from the root.
///
/// Rendered form-field names look like `order.items[0].amount`; unnamed
/// parameters render as `#1`. None of `.`, `[`, `]` or `#` can appear in a
/// Solidity identifier, so two different paths never render to the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArgPath {
    segments: Vec<PathSegment>,
}

impl ArgPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn field(&self, name: &str) -> Self {
        self.child(PathSegment::Field(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    pub fn position(&self, position: usize) -> Self {
        self.child(PathSegment::Position(position))
    }

    /// Path of a declared parameter: by name when it has one, by position otherwise.
    pub fn param(&self, name: &str, position: usize) -> Self {
        if name.is_empty() {
            self.position(position)
        } else {
            self.field(name)
        }
    }

    /// Whether `self` is `ancestor` or lies below it.
    pub fn starts_with(&self, ancestor: &ArgPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for ArgPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{name}")?;
                }
                PathSegment::Position(position) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "#{position}")?;
                }
            }
        }
        Ok(())
    }
}

fn invalid(path: &str, reason: &str) -> ComposeError {
    ComposeError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number(path: &str, digits: &str) -> Result<usize, ComposeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(path, "expected a decimal number"));
    }
    digits
        .parse::<usize>()
        .map_err(|_| invalid(path, "number out of range"))
}

/// Parses a field name or `#position` from the front of `rest`.
fn parse_name<'a>(path: &str, rest: &'a str) -> Result<(PathSegment, &'a str), ComposeError> {
    let end = rest.find(['.', '[', ']']).unwrap_or(rest.len());
    let (token, rest) = rest.split_at(end);

    let segment = if let Some(digits) = token.strip_prefix('#') {
        PathSegment::Position(parse_number(path, digits)?)
    } else {
        if token.is_empty() {
            return Err(invalid(path, "empty field name"));
        }
        if token.contains('#') {
            return Err(invalid(path, "`#` inside a field name"));
        }
        PathSegment::Field(token.to_string())
    };

    Ok((segment, rest))
}

impl FromStr for ArgPath {
    type Err = ComposeError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut segments = vec![];
        let mut rest = path;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                if segments.is_empty() {
                    return Err(invalid(path, "path cannot start with an index"));
                }
                let close = after
                    .find(']')
                    .ok_or_else(|| invalid(path, "unclosed `[`"))?;
                segments.push(PathSegment::Index(parse_number(path, &after[..close])?));
                rest = &after[close + 1..];
            } else if let Some(after) = rest.strip_prefix('.') {
                if segments.is_empty() {
                    return Err(invalid(path, "path cannot start with `.`"));
                }
                let (segment, after) = parse_name(path, after)?;
                segments.push(segment);
                rest = after;
            } else if segments.is_empty() {
                let (segment, after) = parse_name(path, rest)?;
                segments.push(segment);
                rest = after;
            } else {
                return Err(invalid(path, "expected `.` or `[`"));
            }
        }

        Ok(Self { segments })
    }
}

impl TryFrom<String> for ArgPath {
    type Error = ComposeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArgPath> for String {
    fn from(path: ArgPath) -> Self {
        path.to_string()
    }
}

/// One form field: where it sits in the parameter tree and the text the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatArgument {
    pub path: ArgPath,
    #[serde(rename = "value")]
    pub raw_value: String,
}

impl FlatArgument {
    pub fn new(path: ArgPath, raw_value: impl Into<String>) -> Self {
        Self {
            path,
            raw_value: raw_value.into(),
        }
    }
}
