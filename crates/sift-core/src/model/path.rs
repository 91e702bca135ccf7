use crate::model::{entity::EntityModel, field::FieldKind};
use std::{fmt, ops::Deref};
use thiserror::Error as ThisError;

///
/// AttributePath
/// Resolved, dot-separated attribute path (`community.className`).
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl Deref for AttributePath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

///
/// AttributeHandle
///
/// Terminal attribute reached by path resolution: the full path plus the
/// declared kind of the last segment.
///

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeHandle {
    path: AttributePath,
    kind: FieldKind,
    nullable: bool,
}

impl AttributeHandle {
    #[must_use]
    pub const fn path(&self) -> &AttributePath {
        &self.path
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// True when any segment along the path is nullable.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// ResolveError
///
/// A path segment that does not exist on the type reached so far.
/// `owner` is the root entity if the first segment fails.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("could not resolve attribute '{segment}' of {owner}")]
pub struct ResolveError {
    pub segment: String,
    pub owner: String,
}

/// Resolve a dot-separated path against `root`, navigating relations.
///
/// Fails on the first segment that cannot be found; no partial handle is
/// returned.
pub fn resolve(root: &EntityModel, path: &str) -> Result<AttributeHandle, ResolveError> {
    let mut segments = Vec::new();
    let mut reached: Option<FieldKind> = None;
    let mut nullable = false;

    for segment in path.split('.') {
        let field = match reached {
            None => root.field(segment).ok_or_else(|| unresolved(segment, root.name))?,
            Some(kind) => {
                let Some(target) = kind.target() else {
                    return Err(unresolved(segment, kind.type_name()));
                };

                target
                    .field(segment)
                    .ok_or_else(|| unresolved(segment, target.name))?
            }
        };

        segments.push(segment.to_string());
        nullable |= field.nullable;
        reached = Some(field.kind);
    }

    // split always yields at least one segment, so the loop ran
    let kind = reached.ok_or_else(|| unresolved(path, root.name))?;

    Ok(AttributeHandle {
        path: AttributePath(segments),
        kind,
        nullable,
    })
}

fn unresolved(segment: &str, owner: &str) -> ResolveError {
    ResolveError {
        segment: segment.to_string(),
        owner: owner.to_string(),
    }
}
