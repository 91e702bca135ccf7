use crate::{
    backend::QueryBackend,
    error::CompileError,
    filter::SortSpec,
    model::{EntityModel, resolve},
};

/// Resolve each sort entry and emit backend sort expressions in input order.
///
/// Unresolvable paths fail with `InvalidSortingField` carrying the whole
/// path, so callers can tell sort failures from filter failures.
pub fn compile_sort<B: QueryBackend>(
    backend: &B,
    sort: &[SortSpec],
    model: &EntityModel,
) -> Result<Vec<B::Order>, CompileError> {
    sort.iter()
        .map(|entry| {
            let attr = resolve(model, &entry.field).map_err(|_| CompileError::InvalidSortingField {
                field: entry.field.clone(),
            })?;

            Ok(backend.order(&attr, entry.direction))
        })
        .collect()
}
