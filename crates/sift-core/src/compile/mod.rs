//! Search compiler.
//!
//! Walks a `SearchSpec` recursively and drives a `QueryBackend` to produce
//! one combined predicate plus an ordered list of sort expressions. The
//! compiler holds no per-call state; every call builds a fresh tree.
mod sort;

#[cfg(test)]
mod tests;

use crate::{
    backend::QueryBackend,
    config::CompilerConfig,
    error::CompileError,
    filter::{Combinator, Criterion, FilterNode, Group, SearchSpec},
    model::{EntityModel, resolve},
    obs::sink::{self, MetricsEvent},
    registry::OperationRegistry,
    value::coerce,
};
use tracing::{debug, trace};

// re-exports
pub use sort::compile_sort;

///
/// CompiledQuery
/// Output of one compilation: the combined predicate and sort keys in
/// precedence order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery<P, O> {
    pub predicate: P,
    pub order: Vec<O>,
}

///
/// Compiler
///

pub struct Compiler<'a, B: QueryBackend> {
    backend: &'a B,
    registry: &'a OperationRegistry<B>,
    config: CompilerConfig,
}

impl<'a, B: QueryBackend> Compiler<'a, B> {
    #[must_use]
    pub fn new(backend: &'a B, registry: &'a OperationRegistry<B>) -> Self {
        Self {
            backend,
            registry,
            config: CompilerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile filter and sort against `model`.
    ///
    /// Absent criteria compile to an always-true predicate. The first failure
    /// aborts the whole call.
    pub fn compile(
        &self,
        spec: &SearchSpec,
        model: &EntityModel,
    ) -> Result<CompiledQuery<B::Predicate, B::Order>, CompileError> {
        sink::record(MetricsEvent::CompileStart {
            entity: model.name,
        });
        debug!(
            entity = model.name,
            filtered = spec.criteria.is_some(),
            sort_keys = spec.sort.len(),
            "compile start"
        );

        let mut stats = Stats::default();
        let result = self.compile_inner(spec, model, &mut stats);

        match &result {
            Ok(_) => {
                sink::record(MetricsEvent::CompileFinish {
                    entity: model.name,
                    criteria: stats.criteria,
                    groups: stats.groups,
                    sort_keys: u64::try_from(spec.sort.len()).unwrap_or(u64::MAX),
                });
                debug!(
                    entity = model.name,
                    criteria = stats.criteria,
                    groups = stats.groups,
                    "compile finish"
                );
            }
            Err(err) => {
                sink::record(MetricsEvent::CompileRejected {
                    entity: model.name,
                    kind: err.kind(),
                });
                debug!(entity = model.name, code = err.kind().code(), error = %err, "compile rejected");
            }
        }

        result
    }

    fn compile_inner(
        &self,
        spec: &SearchSpec,
        model: &EntityModel,
        stats: &mut Stats,
    ) -> Result<CompiledQuery<B::Predicate, B::Order>, CompileError> {
        let predicate = match &spec.criteria {
            Some(node) => self.compile_node(node, model, 1, stats)?,
            None => self.backend.always_true(),
        };
        let order = compile_sort(self.backend, &spec.sort, model)?;

        Ok(CompiledQuery { predicate, order })
    }

    /// Compile a bare filter tree.
    pub fn compile_filter(
        &self,
        node: &FilterNode,
        model: &EntityModel,
    ) -> Result<B::Predicate, CompileError> {
        self.compile_node(node, model, 1, &mut Stats::default())
    }

    fn compile_node(
        &self,
        node: &FilterNode,
        model: &EntityModel,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<B::Predicate, CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::MaxDepthExceeded {
                limit: self.config.max_depth,
            });
        }

        match node {
            FilterNode::Criterion(criterion) => {
                stats.criteria += 1;
                self.compile_criterion(criterion, model)
            }
            FilterNode::Group(group) => {
                stats.groups += 1;
                self.compile_group(group, model, depth, stats)
            }
        }
    }

    fn compile_group(
        &self,
        group: &Group,
        model: &EntityModel,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<B::Predicate, CompileError> {
        validate_group(group)?;

        let mut children = group
            .children
            .iter()
            .map(|child| self.compile_node(child, model, depth + 1, stats))
            .collect::<Result<Vec<_>, _>>()?;

        match group.combinator {
            Combinator::And => Ok(self.backend.and(children)),
            Combinator::Or => Ok(self.backend.or(children)),
            Combinator::Not => {
                let child = children.pop().ok_or(CompileError::EmptyConditions {
                    combinator: Combinator::Not,
                })?;

                Ok(self.backend.not(child))
            }
        }
    }

    fn compile_criterion(
        &self,
        criterion: &Criterion,
        model: &EntityModel,
    ) -> Result<B::Predicate, CompileError> {
        let attr = resolve(model, &criterion.field)?;
        let entry = self.registry.get(criterion.operation)?;

        if !entry.arity.accepts(criterion.operands.len()) {
            return Err(CompileError::invalid_operand_count(
                criterion.operation,
                &criterion.operands,
                entry.arity,
            ));
        }

        if !entry.requirement.admits(attr.kind()) {
            return Err(CompileError::IncompatibleOperation {
                operation: criterion.operation,
                field: criterion.field.clone(),
                kind: attr.kind().type_name(),
            });
        }

        let operands = if entry.coerce {
            criterion
                .operands
                .iter()
                .map(|raw| coerce(raw, attr.kind()))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            criterion.operands.clone()
        };

        trace!(
            field = %attr.path(),
            kind = attr.kind().type_name(),
            operation = criterion.operation.name(),
            operands = operands.len(),
            "criterion resolved"
        );

        (entry.build)(self.backend, &attr, operands, &self.config)
    }
}

/// Check a group's child count against its combinator.
pub fn validate_group(group: &Group) -> Result<(), CompileError> {
    let count = group.children.len();
    if count == 0 {
        return Err(CompileError::EmptyConditions {
            combinator: group.combinator,
        });
    }

    let expected = match group.combinator {
        Combinator::Not if count != 1 => "exactly 1",
        Combinator::And | Combinator::Or if count < 2 => "at least 2",
        _ => return Ok(()),
    };

    Err(CompileError::InvalidConditionsCount {
        combinator: group.combinator,
        expected,
    })
}

// Per-call shape counters for telemetry.
#[derive(Default)]
struct Stats {
    criteria: u64,
    groups: u64,
}
