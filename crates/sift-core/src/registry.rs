//! Operation registry.
//!
//! Maps every `Operation` to its operand-count contract, the attribute kinds
//! it accepts, whether operands are coerced, and the builder that turns a
//! resolved attribute plus operands into a backend predicate.
//!
//! A registry is assembled once and is read-only afterwards; it holds only
//! function pointers, so one instance can be shared across threads freely.

use crate::{
    backend::{CompareOp, ExprBackend, QueryBackend},
    config::CompilerConfig,
    error::CompileError,
    filter::Operation,
    model::{AttributeHandle, FieldKind},
    value::Value,
};
use std::{collections::BTreeMap, fmt, sync::LazyLock};

///
/// Arity
/// Operand-count contract of one operation.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "{n} or more"),
        }
    }
}

///
/// FieldRequirement
/// Attribute kinds an operation can be applied to.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRequirement {
    Any,
    Orderable,
    Text,
    Bool,
}

impl FieldRequirement {
    #[must_use]
    pub const fn admits(self, kind: FieldKind) -> bool {
        match self {
            Self::Any => true,
            Self::Orderable => kind.is_orderable(),
            Self::Text => kind.is_text(),
            Self::Bool => kind.is_bool(),
        }
    }
}

/// Predicate builder. Operands have already passed the arity check and, when
/// `OperationSpec::coerce` is set, coercion.
pub type BuildFn<B> = fn(
    &B,
    &AttributeHandle,
    Vec<Value>,
    &CompilerConfig,
) -> Result<<B as QueryBackend>::Predicate, CompileError>;

///
/// OperationSpec
///

pub struct OperationSpec<B: QueryBackend> {
    pub arity: Arity,
    pub requirement: FieldRequirement,
    /// Coerce each operand to the attribute's native type before building.
    pub coerce: bool,
    pub build: BuildFn<B>,
}

impl<B: QueryBackend> OperationSpec<B> {
    #[must_use]
    pub const fn new(arity: Arity, requirement: FieldRequirement, build: BuildFn<B>) -> Self {
        Self {
            arity,
            requirement,
            coerce: true,
            build,
        }
    }

    /// Pass operands to the builder as supplied.
    #[must_use]
    pub const fn raw(mut self) -> Self {
        self.coerce = false;
        self
    }
}

impl<B: QueryBackend> Clone for OperationSpec<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: QueryBackend> Copy for OperationSpec<B> {}

impl<B: QueryBackend> fmt::Debug for OperationSpec<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSpec")
            .field("arity", &self.arity)
            .field("requirement", &self.requirement)
            .field("coerce", &self.coerce)
            .finish_non_exhaustive()
    }
}

///
/// OperationRegistry
///

pub struct OperationRegistry<B: QueryBackend> {
    entries: BTreeMap<Operation, OperationSpec<B>>,
}

impl<B: QueryBackend> OperationRegistry<B> {
    /// Registry covering every operation.
    #[must_use]
    pub fn standard() -> Self {
        RegistryBuilder::standard().build()
    }

    /// Start from an empty registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder<B> {
        RegistryBuilder {
            entries: BTreeMap::new(),
        }
    }

    /// Look up an operation; operations missing from this registry are
    /// reported as `InvalidOperation`.
    pub fn get(&self, operation: Operation) -> Result<&OperationSpec<B>, CompileError> {
        self.entries
            .get(&operation)
            .ok_or_else(|| CompileError::InvalidOperation {
                name: operation.name().to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, operation: Operation) -> bool {
        self.entries.contains_key(&operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B: QueryBackend> fmt::Debug for OperationRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

///
/// RegistryBuilder
/// Only way to assemble a registry; consumed by `build`.
///

pub struct RegistryBuilder<B: QueryBackend> {
    entries: BTreeMap<Operation, OperationSpec<B>>,
}

impl<B: QueryBackend> RegistryBuilder<B> {
    /// Builder pre-populated with every standard operation.
    #[must_use]
    pub fn standard() -> Self {
        let mut builder = OperationRegistry::builder();
        for operation in Operation::ALL {
            builder = builder.register(operation, standard_spec(operation));
        }

        builder
    }

    /// Add or replace the entry for `operation`.
    #[must_use]
    pub fn register(mut self, operation: Operation, spec: OperationSpec<B>) -> Self {
        self.entries.insert(operation, spec);
        self
    }

    #[must_use]
    pub fn without(mut self, operation: Operation) -> Self {
        self.entries.remove(&operation);
        self
    }

    #[must_use]
    pub fn build(self) -> OperationRegistry<B> {
        OperationRegistry {
            entries: self.entries,
        }
    }
}

/// Process-wide standard registry for the bundled expression backend.
#[must_use]
pub fn default_registry() -> &'static OperationRegistry<ExprBackend> {
    static REGISTRY: LazyLock<OperationRegistry<ExprBackend>> =
        LazyLock::new(OperationRegistry::standard);

    &REGISTRY
}

//
// Standard table
//

/// Standard contract and builder for one operation.
#[must_use]
pub fn standard_spec<B: QueryBackend>(operation: Operation) -> OperationSpec<B> {
    use Arity::{AtLeast, Exactly};
    use FieldRequirement::{Any, Bool, Orderable, Text};

    match operation {
        Operation::Equal => OperationSpec::new(Exactly(1), Any, build_eq::<B>),
        Operation::NotEqual => OperationSpec::new(Exactly(1), Any, build_ne::<B>),
        Operation::LessThan => OperationSpec::new(Exactly(1), Orderable, build_lt::<B>),
        Operation::LessThanEqual => OperationSpec::new(Exactly(1), Orderable, build_lte::<B>),
        Operation::GreaterThan => OperationSpec::new(Exactly(1), Orderable, build_gt::<B>),
        Operation::GreaterThanEqual => OperationSpec::new(Exactly(1), Orderable, build_gte::<B>),
        Operation::Between => OperationSpec::new(Exactly(2), Orderable, build_between::<B>),
        Operation::Like => OperationSpec::new(Exactly(1), Text, build_like::<B>),
        Operation::NotLike => OperationSpec::new(Exactly(1), Text, build_not_like::<B>),
        Operation::In => OperationSpec::new(AtLeast(0), Any, build_in::<B>).raw(),
        Operation::NotIn => OperationSpec::new(AtLeast(0), Any, build_not_in::<B>).raw(),
        Operation::IsNull => OperationSpec::new(Exactly(0), Any, build_is_null::<B>),
        Operation::IsNotNull => OperationSpec::new(Exactly(0), Any, build_is_not_null::<B>),
        Operation::IsTrue => OperationSpec::new(Exactly(0), Bool, build_is_true::<B>),
        Operation::IsFalse => OperationSpec::new(Exactly(0), Bool, build_is_false::<B>),
        Operation::IsEmptyString => OperationSpec::new(Exactly(0), Text, build_is_empty::<B>),
        Operation::IsNotEmptyString => {
            OperationSpec::new(Exactly(0), Text, build_is_not_empty::<B>)
        }
    }
}

// Move exactly N operands out of the list.
fn take<const N: usize>(
    operation: Operation,
    operands: Vec<Value>,
) -> Result<[Value; N], CompileError> {
    <[Value; N]>::try_from(operands).map_err(|operands| {
        CompileError::invalid_operand_count(operation, &operands, Arity::Exactly(N))
    })
}

macro_rules! compare_builder {
    ( $( $name:ident => ($operation:ident, $op:ident) ),* $(,)? ) => {
        $(
            fn $name<B: QueryBackend>(
                backend: &B,
                attr: &AttributeHandle,
                operands: Vec<Value>,
                _: &CompilerConfig,
            ) -> Result<B::Predicate, CompileError> {
                let [value] = take(Operation::$operation, operands)?;

                Ok(backend.compare(attr, CompareOp::$op, value))
            }
        )*
    };
}

compare_builder! {
    build_eq => (Equal, Eq),
    build_ne => (NotEqual, Ne),
    build_lt => (LessThan, Lt),
    build_lte => (LessThanEqual, Lte),
    build_gt => (GreaterThan, Gt),
    build_gte => (GreaterThanEqual, Gte),
}

macro_rules! unary_builder {
    ( $( $name:ident => |$backend:ident, $attr:ident| $body:expr ),* $(,)? ) => {
        $(
            fn $name<B: QueryBackend>(
                $backend: &B,
                $attr: &AttributeHandle,
                _: Vec<Value>,
                _: &CompilerConfig,
            ) -> Result<B::Predicate, CompileError> {
                Ok($body)
            }
        )*
    };
}

unary_builder! {
    build_is_null => |backend, attr| backend.is_null(attr),
    build_is_not_null => |backend, attr| backend.is_not_null(attr),
    build_is_true => |backend, attr| backend.compare(attr, CompareOp::Eq, Value::Bool(true)),
    build_is_false => |backend, attr| backend.compare(attr, CompareOp::Eq, Value::Bool(false)),
    build_is_empty => |backend, attr| backend.compare(attr, CompareOp::Eq, Value::Text(String::new())),
    build_is_not_empty => |backend, attr| backend.compare(attr, CompareOp::Ne, Value::Text(String::new())),
}

fn build_between<B: QueryBackend>(
    backend: &B,
    attr: &AttributeHandle,
    operands: Vec<Value>,
    _: &CompilerConfig,
) -> Result<B::Predicate, CompileError> {
    let [low, high] = take(Operation::Between, operands)?;

    Ok(backend.between(attr, low, high))
}

fn like_pattern(
    operation: Operation,
    operands: Vec<Value>,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    let [value] = take(operation, operands)?;

    Ok(if config.wrap_like_pattern {
        format!("%{value}%")
    } else {
        value.to_string()
    })
}

fn build_like<B: QueryBackend>(
    backend: &B,
    attr: &AttributeHandle,
    operands: Vec<Value>,
    config: &CompilerConfig,
) -> Result<B::Predicate, CompileError> {
    let pattern = like_pattern(Operation::Like, operands, config)?;

    Ok(backend.like(attr, pattern))
}

fn build_not_like<B: QueryBackend>(
    backend: &B,
    attr: &AttributeHandle,
    operands: Vec<Value>,
    config: &CompilerConfig,
) -> Result<B::Predicate, CompileError> {
    let pattern = like_pattern(Operation::NotLike, operands, config)?;

    Ok(backend.not_like(attr, pattern))
}

// Empty IN matches nothing.
fn build_in<B: QueryBackend>(
    backend: &B,
    attr: &AttributeHandle,
    operands: Vec<Value>,
    _: &CompilerConfig,
) -> Result<B::Predicate, CompileError> {
    Ok(if operands.is_empty() {
        backend.always_false()
    } else {
        backend.in_list(attr, operands)
    })
}

// Empty NOT IN matches everything.
fn build_not_in<B: QueryBackend>(
    backend: &B,
    attr: &AttributeHandle,
    operands: Vec<Value>,
    _: &CompilerConfig,
) -> Result<B::Predicate, CompileError> {
    Ok(if operands.is_empty() {
        backend.always_true()
    } else {
        backend.not_in_list(attr, operands)
    })
}
