use crate::{
    backend::{
        CompareOp,
        expr::{Expr, OrderExpr},
    },
    compile::CompiledQuery,
    filter::SortDirection,
    value::Value,
};
use std::cmp::Ordering;

///
/// Row
///
/// Abstraction over a stored record that can expose attribute values by
/// resolved path. Navigating through an absent relation yields `Null`.
///

pub trait Row {
    fn value(&self, path: &[String]) -> Value;
}

///
/// Evaluate a compiled predicate against a single row.
///
/// Comparisons involving `Null`, or values without a defined ordering,
/// never match. `Not` is plain boolean negation.
///
#[must_use]
pub fn eval<R: Row + ?Sized>(row: &R, expr: &Expr) -> bool {
    match expr {
        Expr::True => true,
        Expr::False => false,

        Expr::And(children) => children.iter().all(|child| eval(row, child)),
        Expr::Or(children) => children.iter().any(|child| eval(row, child)),
        Expr::Not(child) => !eval(row, child),

        Expr::Compare { attr, op, value } => row
            .value(attr)
            .compare(value)
            .is_some_and(|ord| compare_matches(*op, ord)),

        Expr::Between { attr, low, high } => {
            let actual = row.value(attr);
            actual.compare(low).is_some_and(Ordering::is_ge)
                && actual.compare(high).is_some_and(Ordering::is_le)
        }

        Expr::Like { attr, pattern } => on_text(row, attr, |text| like_match(text, pattern)),
        Expr::NotLike { attr, pattern } => on_text(row, attr, |text| !like_match(text, pattern)),

        Expr::IsNull { attr } => row.value(attr).is_null(),
        Expr::IsNotNull { attr } => !row.value(attr).is_null(),

        Expr::In { attr, values } => {
            on_present(row, attr, |actual| contains(values, actual))
        }
        Expr::NotIn { attr, values } => {
            on_present(row, attr, |actual| !contains(values, actual))
        }
    }
}

const fn compare_matches(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord.is_eq(),
        CompareOp::Ne => ord.is_ne(),
        CompareOp::Lt => ord.is_lt(),
        CompareOp::Lte => ord.is_le(),
        CompareOp::Gt => ord.is_gt(),
        CompareOp::Gte => ord.is_ge(),
    }
}

fn on_present<R: Row + ?Sized>(row: &R, path: &[String], f: impl FnOnce(&Value) -> bool) -> bool {
    let actual = row.value(path);
    !actual.is_null() && f(&actual)
}

fn on_text<R: Row + ?Sized>(row: &R, path: &[String], f: impl FnOnce(&str) -> bool) -> bool {
    row.value(path).as_text().is_some_and(f)
}

fn contains(values: &[Value], actual: &Value) -> bool {
    values
        .iter()
        .any(|value| actual.compare(value).is_some_and(Ordering::is_eq))
}

/// Case-sensitive SQL `LIKE`: `%` matches any run, `_` exactly one character.
#[must_use]
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if let Some((star, mark)) = backtrack {
            p = star + 1;
            t = mark + 1;
            backtrack = Some((star, mark + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

/// Order two rows by a list of sort keys; earlier keys take precedence.
/// `Null` sorts before every value in ascending order.
#[must_use]
pub fn compare_rows<R: Row + ?Sized>(left: &R, right: &R, order: &[OrderExpr]) -> Ordering {
    for key in order {
        let ord = compare_nullable(&left.value(&key.attr), &right.value(&key.attr));
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord.is_ne() {
            return ord;
        }
    }

    Ordering::Equal
}

fn compare_nullable(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
    }
}

impl CompiledQuery<Expr, OrderExpr> {
    /// Run the compiled query over `rows`: filter, then stable sort.
    #[must_use]
    pub fn select<'r, R: Row>(&self, rows: &'r [R]) -> Vec<&'r R> {
        let mut selected: Vec<&R> = rows
            .iter()
            .filter(|row| eval(*row, &self.predicate))
            .collect();
        selected.sort_by(|left, right| compare_rows(*left, *right, &self.order));

        selected
    }

    /// Number of rows the predicate matches.
    #[must_use]
    pub fn count<R: Row>(&self, rows: &[R]) -> usize {
        rows.iter().filter(|row| eval(*row, &self.predicate)).count()
    }
}
