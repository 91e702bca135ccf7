//! Core of Sift: filter trees, entity models, value coercion, the operation
//! registry, and the compiler that turns a `SearchSpec` into backend
//! predicates and sort expressions.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod backend;
pub mod compile;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod obs;
pub mod registry;
pub mod value;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

///
/// Macros
///

/// Build a criterion node with the operation named by its variant and each
/// operand converted through `Value::from`.
///
/// ```ignore
/// let node = condition!("gpa", GreaterThan, 3.2);
/// let none = condition!("community", IsNull);
/// ```
#[macro_export]
macro_rules! condition {
    ($field:expr, $op:ident $(, $operand:expr)* $(,)?) => {
        $crate::filter::condition(
            $field,
            $crate::filter::Operation::$op,
            ::std::vec::Vec::<$crate::value::Value>::from([
                $($crate::value::Value::from($operand)),*
            ]),
        )
    };
}

///
/// Prelude
///
/// Vocabulary for building and compiling searches. Errors, metrics, and
/// registry internals stay at their module paths.
///

pub mod prelude {
    pub use crate::{
        backend::{Expr, ExprBackend, QueryBackend, Row},
        compile::{CompiledQuery, Compiler},
        config::CompilerConfig,
        filter::{
            Combinator, Criterion, FilterNode, Group, NO_OPERANDS, Operation, SearchSpec,
            SortDirection, SortSpec, and, ascending, condition, descending, not, or,
        },
        model::{EntityModel, FieldKind, FieldModel},
        registry::{OperationRegistry, default_registry},
        value::Value,
    };
}
