//! Expressions evaluated against host events.


use rulekit::prelude::*;
use test_harness::*;

/// Event payload handed to every expression.
struct Damage {
    victim: Value,
    amounts: Vec<f64>,
    /// Distance to the attacker.
    distance: Feet,
}

fn damage_event() -> Damage {
    Damage {
        victim: Entity::zombie(30.0),
        amounts: vec![4.0, 7.5, 12.0],
        distance: Feet(20.0),
    }
}

fn amounts() -> Box<dyn Expression<Damage>> {
    Box::new(FnExpression::new("damage amounts", builtins::NUMBER, |ctx: &EvalContext<'_, Damage>| {
        ctx.event.amounts.iter().copied().map(|a| Some(Value::from(a))).collect()
    }))
}

fn victim() -> Box<dyn Expression<Damage>> {
    Box::new(
        FnExpression::new("victim", ZOMBIE, |ctx: &EvalContext<'_, Damage>| {
            vec![Some(ctx.event.victim.clone())]
        })
        .single(),
    )
}

fn distance() -> Box<dyn Expression<Damage>> {
    Box::new(
        FnExpression::new("distance", FEET, |ctx: &EvalContext<'_, Damage>| {
            vec![Some(Value::new(ctx.event.distance))]
        })
        .single(),
    )
}

fn lit(value: impl Into<Value>) -> Box<dyn Expression<Damage>> {
    Box::new(Literal::single(value))
}

// =============================================================================
// Quantifiers
// =============================================================================

#[test]
fn test_and_or_checks() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);
    let all = Literal::list(builtins::INTEGER, vec![2i64.into(), 4i64.into(), 5i64.into()], true);
    let any = Literal::list(builtins::INTEGER, vec![2i64.into(), 4i64.into(), 5i64.into()], false);
    let even = |v: &Value| v.as_integer().is_some_and(|i| i % 2 == 0);

    assert!(!all.check(&ctx, &mut |v: &Value| even(v), false));
    assert!(all.check(&ctx, &mut |v: &Value| even(v), true));
    assert!(any.check(&ctx, &mut |v: &Value| even(v), false));
    assert!(!any.check(&ctx, &mut |v: &Value| even(v), true));

    let empty = Literal::list(builtins::INTEGER, Vec::new(), true);
    assert!(!empty.check(&ctx, &mut |_: &Value| true, false));
    assert!(!empty.check(&ctx, &mut |_: &Value| true, true));
}

#[test]
fn test_or_list_yields_one_value() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);
    let any = Literal::list(builtins::INTEGER, vec![1i64.into(), 2i64.into(), 3i64.into()], false);

    assert!(Expression::<()>::is_single(&any));
    for _ in 0..20 {
        let picked = any.get_array(&ctx);
        assert_eq!(picked.len(), 1);
        assert!(matches!(picked[0].as_integer(), Some(1..=3)));
    }
    assert_eq!(any.get_all(&ctx).len(), 3);
}

#[test]
fn test_failed_elements_are_filtered() {
    let registry = game_registry();
    let ctx = EvalContext::detached(&registry);
    let partial = FnExpression::new("partial", builtins::INTEGER, |_: &EvalContext<'_>| {
        vec![Some(Value::from(1i64)), None, Some(Value::from(3i64))]
    });

    assert_eq!(partial.compute(&ctx).len(), 3);
    let ints: Vec<i64> = partial.get_all(&ctx).iter().filter_map(Value::as_integer).collect();
    assert_eq!(ints, vec![1, 3]);
    assert_eq!(partial.get_single(&ctx).and_then(|v| v.as_integer()), Some(1));
}

// =============================================================================
// Event-driven conditions
// =============================================================================

#[test]
fn test_conditions_read_the_event() {
    let registry = game_registry();
    let event = damage_event();
    let ctx = EvalContext::new(&registry, &event);

    // Every hit was above 3, but not every hit was above 5.
    let above_three = Comparison::new(&registry, amounts(), Relation::Greater, lit(3i64)).unwrap();
    let above_five = Comparison::new(&registry, amounts(), Relation::Greater, lit(5i64)).unwrap();
    assert!(above_three.check(&ctx));
    assert!(!above_five.check(&ctx));

    let is_zombie = Comparison::new(&registry, victim(), Relation::Equal, lit("zombie")).unwrap();
    assert!(is_zombie.check(&ctx));
    assert_eq!(is_zombie.to_display(&registry), "victim is equal to zombie");

    // 20 feet is 6.096 meters.
    let close = Comparison::new(
        &registry,
        distance(),
        Relation::SmallerOrEqual,
        Box::new(Literal::single(Value::new(Meters(10.0)))),
    )
    .unwrap();
    assert!(close.check(&ctx));
}

#[test]
fn test_conditions_follow_the_event() {
    let registry = game_registry();
    let cond = Comparison::new(&registry, amounts(), Relation::Greater, lit(3i64)).unwrap();

    let mut event = damage_event();
    assert!(cond.check(&EvalContext::new(&registry, &event)));
    event.amounts.push(1.0);
    assert!(!cond.check(&EvalContext::new(&registry, &event)));
    event.amounts.clear();
    assert!(!cond.check(&EvalContext::new(&registry, &event)));
}

#[test]
fn test_converted_distance() {
    let registry = game_registry();
    let event = damage_event();
    let ctx = EvalContext::new(&registry, &event);

    let meters = ConvertedExpression::new(&registry, distance(), builtins::NUMBER).unwrap();
    assert_eq!(meters.return_type(), builtins::NUMBER);
    let value = meters.get_single(&ctx).and_then(|v| v.as_number()).unwrap();
    assert!((value - 6.096).abs() < 1e-9);

    let err = ConvertedExpression::new(&registry, victim(), builtins::NUMBER)
        .err()
        .unwrap();
    assert!(matches!(err, ResolutionError::NoConverter { .. }));
}
