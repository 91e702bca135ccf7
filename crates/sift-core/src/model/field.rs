use crate::model::entity::EntityModel;
use std::{fmt, ptr};

///
/// FieldModel
/// Attribute metadata used by path resolution and coercion.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldModel {
    /// Attribute name as used in filter and sort paths.
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

///
/// FieldKind
///
/// Declared type of an attribute. Coercion and operation checks match on
/// this tag exhaustively; there is no runtime type inspection.
///

#[derive(Clone, Copy)]
pub enum FieldKind {
    Text,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float, widened to `f64` once coerced.
    Float,
    Double,
    Bool,
    Date,
    DateTime,
    OffsetDateTime,

    /// Single-valued relation to another entity.
    Relation(&'static EntityModel),
    /// Multi-valued relation to another entity.
    Collection(&'static EntityModel),

    /// Any other stored type; operands are passed through unconverted.
    Other(&'static str),
}

impl FieldKind {
    /// Type name used in diagnostics.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Bool => "Bool",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::OffsetDateTime => "OffsetDateTime",
            Self::Relation(target) | Self::Collection(target) => target.name,
            Self::Other(name) => name,
        }
    }

    /// The related entity, if this attribute can be navigated further.
    #[must_use]
    pub const fn target(self) -> Option<&'static EntityModel> {
        match self {
            Self::Relation(target) | Self::Collection(target) => Some(target),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_orderable(self) -> bool {
        !matches!(
            self,
            Self::Relation(_) | Self::Collection(_) | Self::Other(_)
        )
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    #[must_use]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relation(target) => write!(f, "Relation({})", target.name),
            Self::Collection(target) => write!(f, "Collection({})", target.name),
            Self::Other(name) => write!(f, "Other({name})"),
            _ => f.write_str(self.type_name()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Relation(a), Self::Relation(b)) | (Self::Collection(a), Self::Collection(b)) => {
                ptr::eq(*a, *b)
            }
            (Self::Other(a), Self::Other(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}
