use super::*;
use crate::{
    backend::{Expr, ExprBackend, OrderExpr},
    error::ErrorKind,
    filter::{
        NO_OPERANDS, Operation, SortDirection, and, ascending, condition, descending, not, or,
    },
    fixtures::{STUDENT, Student, students},
    obs::{MetricsSink, with_metrics_sink},
    registry::{OperationRegistry, RegistryBuilder, default_registry},
};
use proptest::prelude::*;
use std::cell::RefCell;

fn compiler() -> Compiler<'static, ExprBackend> {
    Compiler::new(&ExprBackend, default_registry())
}

fn compile(spec: &SearchSpec) -> Result<CompiledQuery<Expr, OrderExpr>, CompileError> {
    compiler().compile(spec, &STUDENT)
}

fn filter(node: FilterNode) -> SearchSpec {
    SearchSpec::new().filter(node)
}

fn ids(query: &CompiledQuery<Expr, OrderExpr>, rows: &[Student]) -> Vec<i64> {
    query.select(rows).iter().map(|s| s.id).collect()
}

fn kind_of(spec: &SearchSpec) -> ErrorKind {
    compile(spec).unwrap_err().kind()
}

//
// End-to-end scenarios
//

#[test]
fn greater_than_compiles_to_comparison() {
    let query = compile(&filter(condition("gpa", Operation::GreaterThan, [3.2]))).unwrap();

    assert_eq!(query.predicate.to_string(), "gpa > 3.2");
    assert_eq!(query.count(&students()), 13);
}

#[test]
fn empty_in_matches_nothing_and_empty_not_in_everything() {
    let rows = students();

    let none = compile(&filter(condition("id", Operation::In, NO_OPERANDS))).unwrap();
    assert_eq!(none.predicate, Expr::False);
    assert_eq!(none.count(&rows), 0);

    let all = compile(&filter(condition("id", Operation::NotIn, NO_OPERANDS))).unwrap();
    assert_eq!(all.predicate, Expr::True);
    assert_eq!(all.count(&rows), 20);
}

#[test]
fn conjunction_through_relation() {
    let query = compile(&filter(and([
        condition("community.className", Operation::Like, ["%9%"]),
        condition("gpa", Operation::GreaterThan, [3.5]),
    ])))
    .unwrap();

    assert_eq!(
        query.predicate.to_string(),
        "(community.className LIKE '%%9%%' AND gpa > 3.5)"
    );
    assert_eq!(ids(&query, &students()), [1, 9, 17, 19]);
}

#[test]
fn three_way_disjunction_matches_in_list() {
    let rows = students();
    let letters = ["A", "A-", "A+"];

    let disjunction = compile(&filter(or(letters
        .iter()
        .map(|letter| condition("gpaLetter", Operation::Equal, [*letter])))))
    .unwrap();
    let Expr::Or(children) = &disjunction.predicate else {
        panic!("expected disjunction, got {}", disjunction.predicate);
    };
    assert_eq!(children.len(), 3);

    let membership = compile(&filter(condition("gpaLetter", Operation::In, letters))).unwrap();
    let exclusion = compile(&filter(condition("gpaLetter", Operation::NotIn, letters))).unwrap();

    assert_eq!(disjunction.count(&rows), 11);
    assert_eq!(ids(&disjunction, &rows), ids(&membership, &rows));
    assert_eq!(exclusion.count(&rows), 9);
}

#[test]
fn sort_keys_apply_in_precedence_order() {
    let spec = SearchSpec::new()
        .sort_by(descending("gpa"))
        .sort_by(ascending("firstName"));
    let query = compile(&spec).unwrap();
    let rows = students();
    let selected = query.select(&rows);

    assert_eq!(query.predicate, Expr::True);
    assert_eq!(
        query
            .order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        ["gpa DESC", "firstName ASC"]
    );
    assert_eq!(
        selected.iter().take(5).map(|s| s.id).collect::<Vec<_>>(),
        [19, 13, 5, 1, 15]
    );

    // Omar and Yousef share 3.2
    let names: Vec<_> = selected.iter().map(|s| s.first_name).collect();
    let omar = names.iter().position(|n| *n == "Omar").unwrap();
    let yousef = names.iter().position(|n| *n == "Yousef").unwrap();
    assert_eq!(yousef, omar + 1);
}

#[test]
fn nested_negated_disjunctions() {
    let query = compile(&filter(and([
        not(or([
            condition("id", Operation::In, [1, 2, 3, 4]),
            condition("firstName", Operation::Like, ["%a%"]),
        ])),
        not(or([
            condition("id", Operation::In, [11, 12, 13, 14]),
            condition("firstName", Operation::Like, ["%s%"]),
        ])),
    ])))
    .unwrap();

    assert_eq!(
        query.predicate.to_string(),
        "(NOT ((id IN (1, 2, 3, 4) OR firstName LIKE '%%a%%')) \
         AND NOT ((id IN (11, 12, 13, 14) OR firstName LIKE '%%s%%')))"
    );
    assert_eq!(ids(&query, &students()), [17]);
}

#[test]
fn null_and_boolean_checks() {
    let rows = students();
    let count = |node| compile(&filter(node)).unwrap().count(&rows);

    assert_eq!(count(condition("community", Operation::IsNull, NO_OPERANDS)), 3);
    assert_eq!(count(condition("community", Operation::IsNotNull, NO_OPERANDS)), 17);
    assert_eq!(count(condition("isFullTime", Operation::IsTrue, NO_OPERANDS)), 18);
    assert_eq!(count(condition("isFullTime", Operation::IsFalse, NO_OPERANDS)), 2);
    assert_eq!(count(condition("email", Operation::IsEmptyString, NO_OPERANDS)), 0);
    assert_eq!(count(condition("email", Operation::IsNotEmptyString, NO_OPERANDS)), 20);
}

#[test]
fn operands_are_coerced_to_attribute_types() {
    let rows = students();
    let count = |node| compile(&filter(node)).unwrap().count(&rows);

    assert_eq!(count(condition("community.id", Operation::Equal, [5])), 4);
    assert_eq!(count(condition("firstName", Operation::Like, ["Aya"])), 1);
    assert_eq!(count(condition("dateOfBirth", Operation::Equal, ["1997-05-07"])), 1);
    assert_eq!(count(condition("gpa", Operation::Between, ["3.5", "3.8"])), 5);
    assert_eq!(count(condition("id", Operation::LessThanEqual, ["3"])), 3);
    assert_eq!(count(condition("isFullTime", Operation::Equal, ["false"])), 2);
}

#[test]
fn inequality_and_temporal_comparisons() {
    let rows = students();
    let query = |node| compile(&filter(node)).unwrap();

    let not_a = query(condition("gpaLetter", Operation::NotEqual, ["A"]));
    assert_eq!(not_a.count(&rows), 15);

    let top = query(condition("gpa", Operation::GreaterThanEqual, [3.9]));
    assert_eq!(top.predicate.to_string(), "gpa >= 3.9");
    assert_eq!(ids(&top, &rows), [1, 5, 13, 15, 19]);

    // last login is the enrollment morning, recorded for even ids only
    let recent = query(condition(
        "lastLogin",
        Operation::GreaterThanEqual,
        ["2019-09-01T08:30"],
    ));
    assert_eq!(ids(&recent, &rows), [8, 18]);

    // +03:00 local ten o'clock is seven o'clock UTC
    let updated = query(condition("updatedAt", Operation::Equal, ["2024-01-15T07:00Z"]));
    assert_eq!(ids(&updated, &rows), (1..=10).collect::<Vec<_>>());
}

#[test]
fn absent_criteria_select_everything() {
    let query = compile(&SearchSpec::new()).unwrap();

    assert_eq!(query.predicate, Expr::True);
    assert!(query.order.is_empty());
    assert_eq!(query.count(&students()), 20);
}

//
// Failures
//

#[test]
fn group_arity_is_enforced() {
    assert_eq!(kind_of(&filter(and([]))), ErrorKind::EmptyConditions);
    assert_eq!(kind_of(&filter(or([]))), ErrorKind::EmptyConditions);

    let leaf = || condition("gpa", Operation::GreaterThan, [3.0]);
    assert_eq!(kind_of(&filter(and([leaf()]))), ErrorKind::InvalidConditionsCount);
    assert_eq!(kind_of(&filter(or([leaf()]))), ErrorKind::InvalidConditionsCount);

    let two_negated = FilterNode::Group(Group::new(Combinator::Not, [leaf(), leaf()]));
    assert_eq!(
        compile(&filter(two_negated)).unwrap_err(),
        CompileError::InvalidConditionsCount {
            combinator: Combinator::Not,
            expected: "exactly 1",
        }
    );

    let query = compile(&filter(not(leaf()))).unwrap();
    assert_eq!(query.predicate.to_string(), "NOT (gpa > 3.0)");
}

#[test]
fn operand_counts_are_enforced() {
    let err = compile(&filter(condition("gpa", Operation::Between, [3.0]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperandCount);
    assert_eq!(
        err.to_string(),
        "the operands [3.0] are not compatible with operation BETWEEN; expected exactly 2"
    );

    for operation in [
        Operation::IsNull,
        Operation::IsNotNull,
        Operation::IsTrue,
        Operation::IsFalse,
        Operation::IsEmptyString,
        Operation::IsNotEmptyString,
    ] {
        let field = match operation {
            Operation::IsTrue | Operation::IsFalse => "isFullTime",
            _ => "email",
        };
        assert_eq!(
            kind_of(&filter(condition(field, operation, ["x"]))),
            ErrorKind::InvalidOperandCount,
            "{operation}"
        );
    }

    assert_eq!(
        kind_of(&filter(condition("gpa", Operation::Equal, NO_OPERANDS))),
        ErrorKind::InvalidOperandCount
    );
}

#[test]
fn uncoercible_operand_reports_value_and_type() {
    let err = compile(&filter(condition("credits", Operation::Equal, ["3.7"]))).unwrap_err();

    assert_eq!(
        err,
        CompileError::InvalidFieldValue {
            value: "3.7".to_string(),
            target: "Int",
        }
    );
}

#[test]
fn membership_operands_are_not_coerced() {
    // "1" stays text, so it never equals an integer id
    let query = compile(&filter(condition("id", Operation::In, ["1"]))).unwrap();

    assert_eq!(query.predicate.to_string(), "id IN ('1')");
    assert_eq!(query.count(&students()), 0);
}

#[test]
fn filter_and_sort_paths_fail_distinctly() {
    let err = compile(&filter(condition(
        "community.Teacher",
        Operation::IsNull,
        NO_OPERANDS,
    )))
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidFieldName {
            segment: "Teacher".to_string(),
            owner: "Community".to_string(),
        }
    );

    let err = compile(&SearchSpec::new().sort_by(ascending("community.Teacher"))).unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidSortingField {
            field: "community.Teacher".to_string(),
        }
    );
}

#[test]
fn operation_must_suit_attribute_kind() {
    let err = compile(&filter(condition("gpa", Operation::Like, ["3"]))).unwrap_err();

    assert_eq!(
        err,
        CompileError::IncompatibleOperation {
            operation: Operation::Like,
            field: "gpa".to_string(),
            kind: "Double",
        }
    );
    assert_eq!(
        kind_of(&filter(condition("community", Operation::GreaterThan, [1]))),
        ErrorKind::IncompatibleOperation
    );
}

#[test]
fn first_failure_aborts_compilation() {
    let spec = filter(and([
        condition("teacher", Operation::IsNull, NO_OPERANDS),
        condition("gpa", Operation::Between, NO_OPERANDS),
    ]));

    assert_eq!(kind_of(&spec), ErrorKind::InvalidFieldName);
}

#[test]
fn depth_limit_is_configurable() {
    let leaf = condition("gpa", Operation::GreaterThan, [3.0]);
    let spec = filter(not(not(leaf)));

    let shallow = compiler().with_config(CompilerConfig::new().max_depth(2));
    assert_eq!(
        shallow.compile(&spec, &STUDENT).unwrap_err(),
        CompileError::MaxDepthExceeded { limit: 2 }
    );

    let deep = compiler().with_config(CompilerConfig::new().max_depth(3));
    assert!(deep.compile(&spec, &STUDENT).is_ok());
}

#[test]
fn like_wrapping_can_be_disabled() {
    let compiler = compiler().with_config(CompilerConfig::new().wrap_like_pattern(false));
    let rows = students();

    let exact = compiler
        .compile(&filter(condition("firstName", Operation::Like, ["Aya"])), &STUDENT)
        .unwrap();
    assert_eq!(exact.predicate.to_string(), "firstName LIKE 'Aya'");
    assert_eq!(exact.count(&rows), 1);

    let prefix = compiler
        .compile(&filter(condition("lastName", Operation::NotLike, ["Ha%"])), &STUDENT)
        .unwrap();
    assert_eq!(prefix.count(&rows), 18);
}

#[test]
fn custom_registry_limits_operations() {
    let registry: OperationRegistry<ExprBackend> = RegistryBuilder::standard()
        .without(Operation::Like)
        .build();
    let compiler = Compiler::new(&ExprBackend, &registry);

    let err = compiler
        .compile(&filter(condition("firstName", Operation::Like, ["a"])), &STUDENT)
        .unwrap_err();

    assert_eq!(
        err,
        CompileError::InvalidOperation {
            name: "LIKE".to_string()
        }
    );
}

#[test]
fn sort_on_nullable_relation_puts_nulls_first() {
    let query = compile(&SearchSpec::new().sort_by(ascending("community.className"))).unwrap();
    let rows = students();
    let selected = query.select(&rows);

    assert!(selected.iter().take(3).all(|s| s.community.is_none()));
    assert_eq!(query.order[0].direction, SortDirection::Asc);
}

//
// Telemetry
//

#[derive(Default)]
struct Recorder(RefCell<Vec<MetricsEvent>>);

impl MetricsSink for Recorder {
    fn record(&self, event: MetricsEvent) {
        self.0.borrow_mut().push(event);
    }
}

#[test]
fn compile_reports_shape_to_metrics_sink() {
    let recorder = Recorder::default();
    let spec = filter(and([
        condition("gpa", Operation::GreaterThan, [3.0]),
        condition("community", Operation::IsNull, NO_OPERANDS),
    ]))
    .sort_by(descending("gpa"));

    with_metrics_sink(&recorder, || compile(&spec)).unwrap();

    assert_eq!(
        recorder.0.into_inner(),
        [
            MetricsEvent::CompileStart { entity: "Student" },
            MetricsEvent::CompileFinish {
                entity: "Student",
                criteria: 2,
                groups: 1,
                sort_keys: 1,
            },
        ]
    );
}

#[test]
fn compile_reports_rejection_kind() {
    let recorder = Recorder::default();

    let _ = with_metrics_sink(&recorder, || compile(&filter(or([]))));

    assert_eq!(
        recorder.0.into_inner().last(),
        Some(&MetricsEvent::CompileRejected {
            entity: "Student",
            kind: ErrorKind::EmptyConditions,
        })
    );
}

//
// Properties
//

fn arb_leaf() -> impl Strategy<Value = FilterNode> {
    prop::sample::select(vec![
        condition("gpa", Operation::GreaterThan, [3.2]),
        condition("gpa", Operation::Between, [3.0, 3.6]),
        condition("id", Operation::In, [1, 2, 3]),
        condition("id", Operation::NotIn, NO_OPERANDS),
        condition("firstName", Operation::Like, ["a"]),
        condition("community", Operation::IsNull, NO_OPERANDS),
        condition("community.className", Operation::NotLike, ["9"]),
        condition("isFullTime", Operation::IsTrue, NO_OPERANDS),
        condition("gpaLetter", Operation::Equal, ["A"]),
        condition("dateOfBirth", Operation::LessThan, ["2001-01-01"]),
    ])
}

fn arb_tree() -> impl Strategy<Value = FilterNode> {
    arb_leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(|children| and(children)),
            prop::collection::vec(inner.clone(), 2..4).prop_map(|children| or(children)),
            inner.prop_map(not),
        ]
    })
}

fn arb_combinator() -> impl Strategy<Value = Combinator> {
    prop_oneof![
        Just(Combinator::And),
        Just(Combinator::Or),
        Just(Combinator::Not),
    ]
}

proptest! {
    #[test]
    fn compilation_is_deterministic(tree in arb_tree()) {
        let spec = filter(tree).sort_by(descending("gpa"));

        prop_assert_eq!(compile(&spec).unwrap(), compile(&spec).unwrap());
    }

    #[test]
    fn negation_inverts_every_row(tree in arb_tree()) {
        let rows = students();
        let plain = compile(&filter(tree.clone())).unwrap();
        let negated = compile(&filter(not(tree))).unwrap();

        prop_assert_eq!(plain.count(&rows) + negated.count(&rows), rows.len());
    }

    #[test]
    fn empty_group_anywhere_fails(tree in arb_tree(), combinator in arb_combinator()) {
        let empty = FilterNode::Group(Group::new(combinator, []));
        let spec = filter(and([tree, empty]));

        prop_assert_eq!(kind_of(&spec), ErrorKind::EmptyConditions);
    }

    #[test]
    fn group_child_counts(tree in arb_tree(), extra in 1usize..4) {
        let mut children = vec![tree.clone()];
        children.extend(std::iter::repeat_n(tree.clone(), extra));

        let negated = FilterNode::Group(Group::new(Combinator::Not, children));
        prop_assert_eq!(kind_of(&filter(negated)), ErrorKind::InvalidConditionsCount);

        let single_and = FilterNode::Group(Group::new(Combinator::And, [tree.clone()]));
        prop_assert_eq!(kind_of(&filter(single_and)), ErrorKind::InvalidConditionsCount);

        let pair_or = or([tree.clone(), tree]);
        prop_assert!(compile(&filter(pair_or)).is_ok());
    }
}
