//! ## Crate layout
//! - `core`: filter trees, entity models, coercion, the operation registry,
//!   the compiler, and the bundled expression backend.
//! - `error`: public error type with a stable kind taxonomy.
//!
//! The top-level functions compile against the bundled `ExprBackend` with the
//! standard registry. Other backends use `core::compile::Compiler` directly.

pub use sift_core as core;

pub mod error;

pub use error::{Error, ErrorKind};
pub use sift_core::condition;

use sift_core::{
    backend::{Expr, OrderExpr, Row},
    compile::{CompiledQuery, Compiler},
    config::CompilerConfig,
    filter::SearchSpec,
    model::EntityModel,
    registry::default_registry,
};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Query
/// Compiled search over the bundled expression backend.
///

pub type Query = CompiledQuery<Expr, OrderExpr>;

/// Compile `spec` against `model` with the default configuration.
pub fn compile(spec: &SearchSpec, model: &EntityModel) -> Result<Query, Error> {
    compile_with(spec, model, CompilerConfig::default())
}

pub fn compile_with(
    spec: &SearchSpec,
    model: &EntityModel,
    config: CompilerConfig,
) -> Result<Query, Error> {
    config.validate()?;

    let compiler = Compiler::new(&sift_core::backend::ExprBackend, default_registry())
        .with_config(config);

    Ok(compiler.compile(spec, model)?)
}

/// Compile and run `spec` over `rows` in one step.
pub fn search<'r, R: Row>(
    spec: &SearchSpec,
    model: &EntityModel,
    rows: &'r [R],
) -> Result<Vec<&'r R>, Error> {
    Ok(compile(spec, model)?.select(rows))
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::{Error, Query, compile, search};
    pub use sift_core::prelude::*;
}
