//! Property tests for condition module
//!
//! Covers parser totality, operator semantics against plain Rust comparisons,
//! left-to-right combinator folding and cache consistency.

use proptest::prelude::*;

use crate::condition::ast::{Combinator, Comparison, ConditionExpr, ConditionValue, Operator};
use crate::condition::cache::check_condition;
use crate::condition::evaluator::evaluate;
use crate::condition::parser::parse;
use crate::property::{AgedAttributes, AttributeSet};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// Numeric attribute codes
fn numeric_code_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("CHR"),
        Just("INT"),
        Just("STR"),
        Just("MNY"),
        Just("SPR"),
        Just("LIF"),
        Just("AGE"),
    ]
}

fn comparison_operator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(">"),
        Just("<"),
        Just(">="),
        Just("<="),
        Just("="),
        Just("!="),
    ]
}

fn simple_condition_strategy() -> impl Strategy<Value = String> {
    (numeric_code_strategy(), comparison_operator_strategy(), -20..=20i32)
        .prop_map(|(code, op, val)| format!("{}{}{}", code, op, val))
}

/// Event-history style ids
fn event_ids_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((10000..=10030u32).prop_map(|n| n.to_string()), 0..=8)
}

fn attribute_set_strategy() -> impl Strategy<Value = AttributeSet> {
    (
        -10..=20i32, // chr
        -10..=20i32, // int
        -10..=20i32, // str
        -10..=20i32, // mny
        -10..=20i32, // spr
        -1..=3i32,   // lif
        event_ids_strategy(),
    )
        .prop_map(|(chr, int, str_, mny, spr, lif, evt)| {
            let mut set = AttributeSet::new(chr, int, str_, mny, spr, lif);
            set.evt = evt;
            set
        })
}

fn expected_comparison(lhs: i32, op: &str, rhs: i32) -> bool {
    match op {
        ">" => lhs > rhs,
        "<" => lhs < rhs,
        ">=" => lhs >= rhs,
        "<=" => lhs <= rhs,
        "=" => lhs == rhs,
        "!=" => lhs != rhs,
        _ => unreachable!(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Parsing is total: arbitrary input never panics
    #[test]
    fn prop_parse_never_panics(input in "[A-Z0-9<>=!?&|()\\[\\], ]{0,40}") {
        let _ = parse(&input);
    }

    /// Evaluation of arbitrary input yields a value or a typed error, never a panic
    #[test]
    fn prop_evaluate_never_panics(
        input in "[A-Z0-9<>=!?&|()\\[\\], ]{0,40}",
        set in attribute_set_strategy()
    ) {
        let _ = evaluate(&parse(&input), &set);
    }

    /// A single comparison parses to an atom with the expected pieces
    #[test]
    fn prop_parsed_comparison_structure(
        code in numeric_code_strategy(),
        val in -100..=100i32
    ) {
        let cond = format!("{}>={}", code, val);
        match parse(&cond) {
            ConditionExpr::Atom(atom) => {
                let cmp = Comparison::parse(&atom).unwrap();
                prop_assert_eq!(cmp.attribute, code);
                prop_assert_eq!(cmp.operator, Operator::GreaterEqual);
                prop_assert_eq!(cmp.value, ConditionValue::Integer(val));
            }
            other => prop_assert!(false, "Expected atom, got {:?}", other),
        }
    }

    /// Comparison operators agree with Rust's integer comparisons
    #[test]
    fn prop_comparison_operators(
        code in numeric_code_strategy(),
        op in comparison_operator_strategy(),
        age in -1..=100i32,
        threshold in -20..=20i32,
        set in attribute_set_strategy()
    ) {
        let aged = AgedAttributes { age, attributes: &set };
        let lhs = match code {
            "AGE" => age,
            "CHR" => set.chr,
            "INT" => set.int,
            "STR" => set.str_,
            "MNY" => set.mny,
            "SPR" => set.spr,
            _ => set.lif,
        };
        let cond = format!("{}{}{}", code, op, threshold);
        let result = check_condition(&cond, &aged).unwrap();
        prop_assert_eq!(result, expected_comparison(lhs, op, threshold), "{}", cond);
    }

    /// A chain of comparisons folds strictly left to right
    #[test]
    fn prop_left_to_right_fold(
        conds in prop::collection::vec(simple_condition_strategy(), 1..=5),
        joins in prop::collection::vec(prop::bool::ANY, 4),
        set in attribute_set_strategy()
    ) {
        let aged = AgedAttributes { age: 10, attributes: &set };
        let mut text = conds[0].clone();
        let mut expected = check_condition(&conds[0], &aged).unwrap();
        // `|` with a true prefix settles the whole group
        let mut settled = false;
        for (i, cond) in conds.iter().enumerate().skip(1) {
            let value = check_condition(cond, &aged).unwrap();
            if joins[i - 1] {
                text.push('&');
                if !settled && expected {
                    expected = value;
                }
            } else {
                text.push('|');
                if !settled {
                    if expected {
                        settled = true;
                    } else {
                        expected = value;
                    }
                }
            }
            text.push_str(cond);
        }
        prop_assert_eq!(check_condition(&text, &aged).unwrap(), expected, "{}", text);
    }

    /// Parenthesized groups evaluate like their standalone contents
    #[test]
    fn prop_group_matches_contents(
        a in simple_condition_strategy(),
        b in simple_condition_strategy(),
        set in attribute_set_strategy()
    ) {
        let aged = AgedAttributes { age: 30, attributes: &set };
        let inner = format!("{}|{}", a, b);
        let grouped = format!("({})", inner);
        prop_assert_eq!(
            check_condition(&grouped, &aged).unwrap(),
            check_condition(&inner, &aged).unwrap()
        );

        let combined = format!("({})&{}", inner, a);
        let expected = check_condition(&inner, &aged).unwrap()
            && check_condition(&a, &aged).unwrap();
        prop_assert_eq!(check_condition(&combined, &aged).unwrap(), expected);
    }

    /// `?` holds when any history entry is listed; `!` is its negation
    #[test]
    fn prop_list_membership(
        set in attribute_set_strategy(),
        wanted in event_ids_strategy()
    ) {
        let list = wanted.join(", ");
        let includes = check_condition(&format!("EVT?[{}]", list), &set).unwrap();
        let excludes = check_condition(&format!("EVT![{}]", list), &set).unwrap();

        let expected = set.evt.iter().any(|v| wanted.contains(v));
        prop_assert_eq!(includes, expected);
        prop_assert_eq!(excludes, !expected);
    }

    /// Whitespace outside lists never changes the parse
    #[test]
    fn prop_whitespace_insignificant(
        a in simple_condition_strategy(),
        b in simple_condition_strategy(),
        pad in " {0,3}"
    ) {
        let tight = format!("({}&{})", a, b);
        let loose = format!("{p}({p}{}{p}&{p}{}{p}){p}", a, b, p = pad);
        prop_assert_eq!(parse(&tight), parse(&loose));
    }

    /// Well-formed chains keep the combinator invariant
    #[test]
    fn prop_group_invariant(
        conds in prop::collection::vec(simple_condition_strategy(), 2..=6),
        use_and in prop::bool::ANY
    ) {
        let joined = conds.join(if use_and { "&" } else { "|" });
        match parse(&joined) {
            ConditionExpr::Group { operands, combinators } => {
                prop_assert_eq!(operands.len(), conds.len());
                prop_assert_eq!(combinators.len(), conds.len() - 1);
                let want = if use_and { Combinator::And } else { Combinator::Or };
                prop_assert!(combinators.iter().all(|c| *c == want));
            }
            other => prop_assert!(false, "Expected group, got {:?}", other),
        }
    }

    /// Empty conditions always hold
    #[test]
    fn prop_empty_condition_returns_true(set in attribute_set_strategy()) {
        prop_assert!(check_condition("", &set).unwrap());
    }

    /// Nested parentheses of any depth evaluate within the depth limit or
    /// report a malformed condition
    #[test]
    fn prop_nesting_depth_is_bounded(depth in 0..=400usize, set in attribute_set_strategy()) {
        let cond = format!("{}CHR>=-100{}", "(".repeat(depth), ")".repeat(depth));
        let result = evaluate(&parse(&cond), &set);
        if depth <= crate::condition::parser::MAX_DEPTH {
            prop_assert_eq!(result, Ok(true));
        } else {
            prop_assert!(matches!(result, Err(crate::error::RestartError::MalformedCondition(_))));
        }
    }
}
