//! Comparator resolution and comparison conditions against a populated
//! registry.


use rulekit::prelude::*;
use rulekit::rulekit_registry::{ConverterKind, ResolutionStep};
use test_harness::*;

fn lit(value: impl Into<Value>) -> Box<dyn Expression> {
    Box::new(Literal::single(value))
}

fn values(ty: TypeHash, values: Vec<Value>) -> Box<dyn Expression> {
    Box::new(FnExpression::new("values", ty, move |_: &EvalContext<'_>| {
        values.iter().cloned().map(Some).collect()
    }))
}

// =============================================================================
// Resolution steps
// =============================================================================

#[test]
fn test_integer_smaller_than_number_via_single_side() {
    let registry = game_registry();
    let resolved = registry
        .resolve_comparison(&ComparisonQuery::binary(builtins::INTEGER, builtins::NUMBER))
        .unwrap();

    assert_eq!(resolved.step(), ResolutionStep::SingleSide);
    assert_eq!(
        resolved.compare(registry.hierarchy(), &Value::from(3i64), &Value::from(4.5)),
        Some(Relation::Smaller)
    );
}

#[test]
fn test_direct_comparator_needs_no_conversion() {
    let registry = game_registry();
    let resolved = registry
        .resolve_comparison(&ComparisonQuery::binary(PLAYER, builtins::TEXT))
        .unwrap();

    assert_eq!(resolved.step(), ResolutionStep::Exact);
    assert!(!resolved.is_reversed());
    assert_eq!(resolved.first_converter().kind(), ConverterKind::Identity);
    assert_eq!(resolved.second_converter().kind(), ConverterKind::Identity);
}

#[test]
fn test_swapped_operands_are_reversed() {
    let registry = game_registry();
    let resolved = registry
        .resolve_comparison(&ComparisonQuery::binary(builtins::TEXT, ZOMBIE))
        .unwrap();

    assert_eq!(resolved.step(), ResolutionStep::Exact);
    assert!(resolved.is_reversed());
    let relation = resolved.compare(
        registry.hierarchy(),
        &Value::from("ZOMBIE"),
        &Entity::zombie(20.0),
    );
    assert_eq!(relation, Some(Relation::Equal));
}

#[test]
fn test_both_sides_converted() {
    let registry = game_registry();
    let resolved = registry
        .resolve_comparison(&ComparisonQuery::binary(FEET, METERS))
        .unwrap();

    assert_eq!(resolved.step(), ResolutionStep::DoubleSide);
    // 10 feet is 3.048 meters.
    let relation = resolved.compare(
        registry.hierarchy(),
        &Value::new(Feet(10.0)),
        &Value::new(Meters(3.0)),
    );
    assert_eq!(relation, Some(Relation::Greater));
}

#[test]
fn test_failed_runtime_conversion_has_no_relation() {
    let registry = game_registry();
    let resolved = registry
        .resolve_comparison(&ComparisonQuery::binary(FEET, METERS))
        .unwrap();
    let relation = resolved.compare(
        registry.hierarchy(),
        &Value::new(Feet(-1.0)),
        &Value::new(Meters(3.0)),
    );
    assert_eq!(relation, None);
}

#[test]
fn test_incomparable_types_fail_at_compile_time() {
    let registry = game_registry();
    let err = registry
        .resolve_comparison(&ComparisonQuery::binary(builtins::BOOLEAN, PLAYER))
        .unwrap_err();
    assert_eq!(err.to_string(), "'boolean' and 'player' cannot be compared");

    let err = registry
        .resolve_comparison(&ComparisonQuery::between(
            builtins::INTEGER,
            builtins::BOOLEAN,
            builtins::INTEGER,
        ))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'integer', 'boolean' and 'integer' cannot be compared"
    );
}

// =============================================================================
// Conditions
// =============================================================================

#[test]
fn test_condition_scenario() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);

    let cond = Comparison::new(&registry, lit(3i64), Relation::Smaller, lit(4.5)).unwrap();
    assert!(cond.check(&ctx));

    let cond = Comparison::new(&registry, lit(3i64), Relation::GreaterOrEqual, lit(4.5)).unwrap();
    assert!(!cond.check(&ctx));
}

#[test]
fn test_equality_only_comparator_rejects_ordering() {
    let registry = game_registry();
    let player = values(PLAYER, vec![Entity::player("alice", 20.0)]);
    let err = Comparison::new(&registry, player, Relation::Greater, lit("bob"))
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "'player' and 'text' can only be compared for equality, not 'greater than'"
    );
}

#[test]
fn test_between_and_not_between() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);

    let cases = [(0.5, false), (1.0, true), (2.5, true), (4.0, true), (4.01, false)];
    for (x, inside) in cases {
        let between = Comparison::between(&registry, lit(x), lit(1i64), lit(4i64), false).unwrap();
        let not_between =
            Comparison::between(&registry, lit(x), lit(1i64), lit(4i64), true).unwrap();
        assert_eq!(between.check(&ctx), inside, "{x} between 1 and 4");
        assert_eq!(not_between.check(&ctx), !inside, "{x} not between 1 and 4");
    }
}

#[test]
fn test_between_with_a_reversed_comparator() {
    const WORD: TypeHash = TypeHash::from_name("word");
    let word = |text: &str| -> Box<dyn Expression> {
        Box::new(Literal::single(Value::with_type(WORD, text.to_string())))
    };

    let mut registry = game_registry();
    registry.register_type(TypeDescriptor::new("word")).unwrap();
    // Words relate to integers by their length.
    registry
        .register_comparator(
            WORD,
            builtins::INTEGER,
            FnComparator::ordered(|word, n| {
                match (word.downcast_ref::<String>(), n.as_integer()) {
                    (Some(word), Some(n)) => Relation::from_difference(word.len() as i64 - n),
                    _ => Relation::NotEqual,
                }
            }),
        )
        .unwrap();
    let ctx = EvalContext::detached(&registry);

    let resolved = registry
        .resolve_comparison(&ComparisonQuery::between(builtins::INTEGER, WORD, WORD))
        .unwrap();
    assert_eq!(resolved.step(), ResolutionStep::Exact);
    assert!(resolved.is_reversed());

    let cases = [(1i64, false), (2, true), (3, true), (4, true), (5, false)];
    for (x, inside) in cases {
        let between =
            Comparison::between(&registry, lit(x), word("ab"), word("abcd"), false).unwrap();
        let not_between =
            Comparison::between(&registry, lit(x), word("ab"), word("abcd"), true).unwrap();
        assert!(between.resolved().unwrap().is_reversed());
        assert_eq!(between.check(&ctx), inside, "{x} between 'ab' and 'abcd'");
        assert_eq!(not_between.check(&ctx), !inside, "{x} not between 'ab' and 'abcd'");
    }
}

#[test]
fn test_between_needs_ordering() {
    let registry = game_registry();
    let err = Comparison::<()>::between(&registry, lit("b"), lit("a"), lit("c"), false)
        .err()
        .unwrap();
    assert!(matches!(err, ResolutionError::UnsupportedRelation { .. }));
}

#[test]
fn test_subtype_operands_use_the_supertype_comparator() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);
    let players = values(
        PLAYER,
        vec![Entity::player("alice", 20.0), Entity::player("bob", 8.0)],
    );
    let zombies = values(ZOMBIE, vec![Entity::zombie(10.0)]);

    // Not every player is healthier than the zombie.
    let cond = Comparison::new(&registry, players, Relation::Greater, zombies).unwrap();
    assert!(!cond.check(&ctx));
}

#[test]
fn test_untyped_operands_compare_at_run_time() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);
    let anything = || {
        values(
            builtins::OBJECT,
            vec![Entity::player("alice", 20.0), Value::from(7i64)],
        )
    };

    // OR over "alice" and 7: alice's name matches.
    let anything_or: Box<dyn Expression> = Box::new(
        FnExpression::new("anything", builtins::OBJECT, |_: &EvalContext<'_>| {
            vec![Some(Entity::player("alice", 20.0)), Some(Value::from(7i64))]
        })
        .or(),
    );
    let cond = Comparison::new(&registry, anything_or, Relation::Equal, lit("Alice")).unwrap();
    assert!(cond.resolved().is_none());
    assert!(cond.check(&ctx));

    // AND: 7 and "alice" are not comparable, which counts as not equal.
    let cond = Comparison::new(&registry, anything(), Relation::NotEqual, lit("bob")).unwrap();
    assert!(cond.check(&ctx));
    let cond = Comparison::new(&registry, anything(), Relation::Equal, lit("alice")).unwrap();
    assert!(!cond.check(&ctx));
}

#[test]
fn test_runtime_compare_uses_value_types() {
    let registry = game_registry();
    assert_eq!(
        registry.compare(&Value::new(Meters(2.0)), &Value::from(2i64)),
        Some(Relation::Equal)
    );
    assert_eq!(
        registry.compare(&Entity::player("alice", 1.0), &Value::from(true)),
        None
    );
}
