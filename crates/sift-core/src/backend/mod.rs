//! Query-building seam.
//!
//! The compiler never constructs predicates itself; it drives a
//! `QueryBackend`, which owns the predicate and sort-expression types of the
//! underlying query layer. `ExprBackend` is the bundled implementation: it
//! builds an `Expr` tree that renders as SQL-like text and can be evaluated in
//! memory by `eval`.
pub mod eval;
pub mod expr;

use crate::{filter::SortDirection, model::AttributeHandle, value::Value};
use std::fmt;

// re-exports
pub use eval::Row;
pub use expr::{Expr, ExprBackend, OrderExpr};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// QueryBackend
///
/// Predicate and sort-expression primitives of the underlying query layer.
/// All operands arrive already validated and, where the operation requires
/// it, coerced to the attribute's native type.
///

pub trait QueryBackend {
    type Predicate;
    type Order;

    fn always_true(&self) -> Self::Predicate;

    fn always_false(&self) -> Self::Predicate;

    fn compare(&self, attr: &AttributeHandle, op: CompareOp, value: Value) -> Self::Predicate;

    /// Inclusive on both bounds.
    fn between(&self, attr: &AttributeHandle, low: Value, high: Value) -> Self::Predicate;

    /// `pattern` is a complete pattern, wildcards included.
    fn like(&self, attr: &AttributeHandle, pattern: String) -> Self::Predicate;

    fn not_like(&self, attr: &AttributeHandle, pattern: String) -> Self::Predicate {
        let like = self.like(attr, pattern);
        self.not(like)
    }

    fn is_null(&self, attr: &AttributeHandle) -> Self::Predicate;

    fn is_not_null(&self, attr: &AttributeHandle) -> Self::Predicate {
        let is_null = self.is_null(attr);
        self.not(is_null)
    }

    /// Membership over raw literals; `values` is never empty.
    fn in_list(&self, attr: &AttributeHandle, values: Vec<Value>) -> Self::Predicate;

    fn not_in_list(&self, attr: &AttributeHandle, values: Vec<Value>) -> Self::Predicate {
        let in_list = self.in_list(attr, values);
        self.not(in_list)
    }

    fn and(&self, children: Vec<Self::Predicate>) -> Self::Predicate;

    fn or(&self, children: Vec<Self::Predicate>) -> Self::Predicate;

    fn not(&self, child: Self::Predicate) -> Self::Predicate;

    fn order(&self, attr: &AttributeHandle, direction: SortDirection) -> Self::Order;
}
