//! Condition evaluator

use crate::condition::ast::{
    Combinator, Comparison, ConditionExpr, ConditionValue, Operator,
};
use crate::error::{RestartError, Result};
use crate::property::{AttributeSource, AttributeValue};

/// Evaluate an expression against an attribute source.
///
/// Groups are folded left to right. After `&` the next operand is only
/// evaluated while the running result is true; after `|` a true running
/// result ends the whole group. Operands that are skipped are never looked up,
/// so errors inside them never surface.
pub fn evaluate<S: AttributeSource + ?Sized>(expr: &ConditionExpr, source: &S) -> Result<bool> {
    match expr {
        ConditionExpr::Atom(atom) => check_atom(atom, source),
        ConditionExpr::Group {
            operands,
            combinators,
        } => {
            let Some((first, rest)) = operands.split_first() else {
                return Ok(true);
            };

            let mut ret = evaluate(first, source)?;
            for (combinator, operand) in combinators.iter().zip(rest) {
                match combinator {
                    Combinator::And => {
                        if ret {
                            ret = evaluate(operand, source)?;
                        }
                    }
                    Combinator::Or => {
                        if ret {
                            return Ok(true);
                        }
                        ret = evaluate(operand, source)?;
                    }
                }
            }
            Ok(ret)
        }
    }
}

fn check_atom<S: AttributeSource + ?Sized>(atom: &str, source: &S) -> Result<bool> {
    let comparison = Comparison::parse(atom)?;
    let prop = source
        .attribute(&comparison.attribute)
        .ok_or_else(|| RestartError::MissingAttribute(comparison.attribute.clone()))?;

    compare(prop, comparison.operator, &comparison.value)
        .ok_or_else(|| {
            RestartError::TypeMismatch(format!(
                "{} is not defined for {} attribute {}",
                comparison.operator.symbol(),
                match prop {
                    AttributeValue::Number(_) => "numeric",
                    AttributeValue::StringSet(_) => "list",
                },
                comparison.attribute
            ))
        })
}

/// Operator table over (attribute, operand) variants; `None` is an
/// unsupported combination.
fn compare(prop: AttributeValue<'_>, operator: Operator, value: &ConditionValue) -> Option<bool> {
    use AttributeValue::{Number, StringSet};
    use ConditionValue::{Integer, List};

    let result = match (prop, operator, value) {
        (Number(pv), Operator::Greater, Integer(cv)) => pv > *cv,
        (Number(pv), Operator::Less, Integer(cv)) => pv < *cv,
        (Number(pv), Operator::GreaterEqual, Integer(cv)) => pv >= *cv,
        (Number(pv), Operator::LessEqual, Integer(cv)) => pv <= *cv,
        (Number(pv), Operator::Equal, Integer(cv)) => pv == *cv,
        (Number(pv), Operator::NotEqual, Integer(cv)) => pv != *cv,

        // Membership of a number in a list literal; a bare integer is never a list
        (Number(pv), Operator::IncludesAny, List(items)) => number_in(pv, items),
        (Number(pv), Operator::ExcludesAll, List(items)) => !number_in(pv, items),
        (Number(_), Operator::IncludesAny | Operator::ExcludesAll, Integer(_)) => false,

        // List contains / lacks a single value
        (StringSet(list), Operator::Equal, Integer(cv)) => list_contains(list, *cv),
        (StringSet(list), Operator::NotEqual, Integer(cv)) => !list_contains(list, *cv),

        (StringSet(list), Operator::IncludesAny, List(items)) => {
            list.iter().any(|v| items.iter().any(|item| item == v))
        }
        (StringSet(list), Operator::ExcludesAll, List(items)) => {
            !list.iter().any(|v| items.iter().any(|item| item == v))
        }

        _ => return None,
    };
    Some(result)
}

fn number_in(value: i32, items: &[String]) -> bool {
    items
        .iter()
        .any(|item| item.parse::<i32>().map_or(false, |n| n == value))
}

fn list_contains(list: &[String], value: i32) -> bool {
    let needle = value.to_string();
    list.iter().any(|v| *v == needle)
}
