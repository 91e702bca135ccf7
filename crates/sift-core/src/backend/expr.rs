use crate::{
    backend::{CompareOp, QueryBackend},
    filter::SortDirection,
    model::{AttributeHandle, AttributePath},
    value::Value,
};
use std::fmt::{self, Display};

///
/// Expr
///
/// Compiled predicate tree produced by `ExprBackend`.
/// `Display` renders SQL-like text; `eval` runs it against rows.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare {
        attr: AttributePath,
        op: CompareOp,
        value: Value,
    },
    Between {
        attr: AttributePath,
        low: Value,
        high: Value,
    },
    Like {
        attr: AttributePath,
        pattern: String,
    },
    NotLike {
        attr: AttributePath,
        pattern: String,
    },
    IsNull {
        attr: AttributePath,
    },
    IsNotNull {
        attr: AttributePath,
    },
    In {
        attr: AttributePath,
        values: Vec<Value>,
    },
    NotIn {
        attr: AttributePath,
        values: Vec<Value>,
    },
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("TRUE"),
            Self::False => f.write_str("FALSE"),
            Self::And(children) => write_joined(f, children, " AND "),
            Self::Or(children) => write_joined(f, children, " OR "),
            Self::Not(child) => write!(f, "NOT ({child})"),
            Self::Compare { attr, op, value } => write!(f, "{attr} {op} {}", Literal(value)),
            Self::Between { attr, low, high } => {
                write!(f, "{attr} BETWEEN {} AND {}", Literal(low), Literal(high))
            }
            Self::Like { attr, pattern } => write!(f, "{attr} LIKE {}", Quoted(pattern)),
            Self::NotLike { attr, pattern } => write!(f, "{attr} NOT LIKE {}", Quoted(pattern)),
            Self::IsNull { attr } => write!(f, "{attr} IS NULL"),
            Self::IsNotNull { attr } => write!(f, "{attr} IS NOT NULL"),
            Self::In { attr, values } => {
                write!(f, "{attr} IN ")?;
                write_list(f, values)
            }
            Self::NotIn { attr, values } => {
                write!(f, "{attr} NOT IN ")?;
                write_list(f, values)
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Expr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    f.write_str("(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", Literal(value))?;
    }
    f.write_str(")")
}

// SQL literal rendering
struct Literal<'a>(&'a Value);

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("NULL"),
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
            Value::Int(_) | Value::Float(_) => write!(f, "{}", self.0),
            Value::Text(text) => write!(f, "{}", Quoted(text)),
            other => write!(f, "{}", Quoted(&other.to_string())),
        }
    }
}

struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.replace('\'', "''"))
    }
}

///
/// OrderExpr
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderExpr {
    pub attr: AttributePath,
    pub direction: SortDirection,
}

impl Display for OrderExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.attr, self.direction)
    }
}

///
/// ExprBackend
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ExprBackend;

impl QueryBackend for ExprBackend {
    type Predicate = Expr;
    type Order = OrderExpr;

    fn always_true(&self) -> Expr {
        Expr::True
    }

    fn always_false(&self) -> Expr {
        Expr::False
    }

    fn compare(&self, attr: &AttributeHandle, op: CompareOp, value: Value) -> Expr {
        Expr::Compare {
            attr: attr.path().clone(),
            op,
            value,
        }
    }

    fn between(&self, attr: &AttributeHandle, low: Value, high: Value) -> Expr {
        Expr::Between {
            attr: attr.path().clone(),
            low,
            high,
        }
    }

    fn like(&self, attr: &AttributeHandle, pattern: String) -> Expr {
        Expr::Like {
            attr: attr.path().clone(),
            pattern,
        }
    }

    fn not_like(&self, attr: &AttributeHandle, pattern: String) -> Expr {
        Expr::NotLike {
            attr: attr.path().clone(),
            pattern,
        }
    }

    fn is_null(&self, attr: &AttributeHandle) -> Expr {
        Expr::IsNull {
            attr: attr.path().clone(),
        }
    }

    fn is_not_null(&self, attr: &AttributeHandle) -> Expr {
        Expr::IsNotNull {
            attr: attr.path().clone(),
        }
    }

    fn in_list(&self, attr: &AttributeHandle, values: Vec<Value>) -> Expr {
        Expr::In {
            attr: attr.path().clone(),
            values,
        }
    }

    fn not_in_list(&self, attr: &AttributeHandle, values: Vec<Value>) -> Expr {
        Expr::NotIn {
            attr: attr.path().clone(),
            values,
        }
    }

    fn and(&self, children: Vec<Expr>) -> Expr {
        Expr::And(children)
    }

    fn or(&self, children: Vec<Expr>) -> Expr {
        Expr::Or(children)
    }

    fn not(&self, child: Expr) -> Expr {
        Expr::Not(Box::new(child))
    }

    fn order(&self, attr: &AttributeHandle, direction: SortDirection) -> OrderExpr {
        OrderExpr {
            attr: attr.path().clone(),
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures::STUDENT, model::resolve};

    fn attr(path: &str) -> AttributeHandle {
        resolve(&STUDENT, path).unwrap()
    }

    #[test]
    fn renders_comparison_without_parens() {
        let expr = ExprBackend.compare(&attr("gpa"), CompareOp::Gt, Value::Float(3.2));

        assert_eq!(expr.to_string(), "gpa > 3.2");
    }

    #[test]
    fn renders_nested_groups() {
        let b = ExprBackend;
        let expr = b.and(vec![
            b.not(b.or(vec![
                b.in_list(&attr("id"), vec![Value::Int(1), Value::Int(2)]),
                b.like(&attr("firstName"), "%a%".to_string()),
            ])),
            b.is_null(&attr("community")),
        ]);

        assert_eq!(
            expr.to_string(),
            "(NOT ((id IN (1, 2) OR firstName LIKE '%a%')) AND community IS NULL)"
        );
    }

    #[test]
    fn quotes_text_and_temporal_literals() {
        let b = ExprBackend;
        let date = chrono::NaiveDate::from_ymd_opt(1997, 5, 7).unwrap();

        assert_eq!(
            b.compare(&attr("lastName"), CompareOp::Eq, Value::Text("O'Neil".into()))
                .to_string(),
            "lastName = 'O''Neil'"
        );
        assert_eq!(
            b.between(&attr("dateOfBirth"), Value::Date(date), Value::Date(date))
                .to_string(),
            "dateOfBirth BETWEEN '1997-05-07' AND '1997-05-07'"
        );
    }

    #[test]
    fn renders_order_expression() {
        let order = ExprBackend.order(&attr("community.className"), SortDirection::Desc);

        assert_eq!(order.to_string(), "community.className DESC");
    }
}
