//! Declarative filter trees and sort lists.
//!
//! Everything here is a plain value object. Nothing is validated at
//! construction time: group arity, paths, operand counts and operand types are
//! all checked by the compiler, so trees can be assembled incrementally.
mod operation;
mod sort;


use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use operation::Operation;
pub use sort::{SortDirection, SortSpec, ascending, descending};

///
/// FilterNode
///
/// Serializes untagged. Deserialization picks the variant by key: `field`
/// for a criterion, `combinator` for a group.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged, try_from = "RawNode")]
pub enum FilterNode {
    Criterion(Criterion),
    Group(Group),
}

// Union of criterion and group keys; the shape is decided after parsing.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    field: Option<String>,
    operation: Option<Operation>,
    operands: Option<Vec<Value>>,
    combinator: Option<Combinator>,
    children: Option<Vec<FilterNode>>,
}

///
/// NodeShapeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NodeShapeError {
    #[error("filter node has both criterion and group keys")]
    Ambiguous,

    #[error("filter node needs either 'field' or 'combinator'")]
    Unrecognized,

    #[error("criterion on '{field}' is missing 'operation'")]
    MissingOperation { field: String },
}

impl TryFrom<RawNode> for FilterNode {
    type Error = NodeShapeError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let criterion_keys =
            raw.field.is_some() || raw.operation.is_some() || raw.operands.is_some();
        let group_keys = raw.combinator.is_some() || raw.children.is_some();

        match (raw.field, raw.combinator) {
            _ if criterion_keys && group_keys => Err(NodeShapeError::Ambiguous),
            (Some(field), None) => {
                let Some(operation) = raw.operation else {
                    return Err(NodeShapeError::MissingOperation { field });
                };

                Ok(Self::Criterion(Criterion {
                    field,
                    operation,
                    operands: raw.operands.unwrap_or_default(),
                }))
            }
            (None, Some(combinator)) => Ok(Self::Group(Group {
                combinator,
                children: raw.children.unwrap_or_default(),
            })),
            _ => Err(NodeShapeError::Unrecognized),
        }
    }
}

impl From<Criterion> for FilterNode {
    fn from(criterion: Criterion) -> Self {
        Self::Criterion(criterion)
    }
}

impl From<Group> for FilterNode {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

///
/// Criterion
/// One `field operation operand...` condition.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Criterion {
    /// Dot-separated attribute path.
    pub field: String,
    pub operation: Operation,
    #[serde(default)]
    pub operands: Vec<Value>,
}

impl Criterion {
    pub fn new<I, V>(field: impl Into<String>, operation: Operation, operands: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.into(),
            operation,
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }
}

///
/// Combinator
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Combinator {
    And,
    Or,
    Not,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        })
    }
}

///
/// Group
/// Boolean combination of child nodes.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Group {
    pub combinator: Combinator,
    #[serde(default)]
    pub children: Vec<FilterNode>,
}

impl Group {
    pub fn new(combinator: Combinator, children: impl IntoIterator<Item = FilterNode>) -> Self {
        Self {
            combinator,
            children: children.into_iter().collect(),
        }
    }
}

///
/// SearchSpec
///
/// Root of a search request: optional criteria plus an ordered sort key.
/// Absent criteria compile to an always-true predicate.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSpec {
    pub criteria: Option<FilterNode>,
    pub sort: Vec<SortSpec>,
}

impl SearchSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, node: impl Into<FilterNode>) -> Self {
        self.criteria = Some(node.into());
        self
    }

    /// Append one sort entry; earlier entries take precedence.
    #[must_use]
    pub fn sort_by(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }
}

//
// Constructors
//

/// Build a single condition. Use `NO_OPERANDS` for operand-less operations.
pub fn condition<I, V>(field: impl Into<String>, operation: Operation, operands: I) -> FilterNode
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    FilterNode::Criterion(Criterion::new(field, operation, operands))
}

/// Empty operand list for `IS_NULL`, `IS_TRUE`, empty `IN`, etc.
pub const NO_OPERANDS: [Value; 0] = [];

/// Conjunction of two or more nodes.
pub fn and(children: impl IntoIterator<Item = FilterNode>) -> FilterNode {
    FilterNode::Group(Group::new(Combinator::And, children))
}

/// Disjunction of two or more nodes.
pub fn or(children: impl IntoIterator<Item = FilterNode>) -> FilterNode {
    FilterNode::Group(Group::new(Combinator::Or, children))
}

/// Negation of exactly one node.
#[must_use]
pub fn not(child: FilterNode) -> FilterNode {
    FilterNode::Group(Group::new(Combinator::Not, [child]))
}
