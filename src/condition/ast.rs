//! Expression tree and atomic comparisons for condition strings

use crate::error::{RestartError, Result};
use smallvec::SmallVec;

/// Boolean joiner between sibling operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `&`
    And,
    /// `|`
    Or,
}

/// Parsed condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpr {
    /// A single comparison such as `CHR>5`, kept as source text
    Atom(String),
    /// Operands joined left to right; `combinators.len() == operands.len() - 1`
    /// for any non-empty group
    Group {
        operands: Vec<ConditionExpr>,
        combinators: Vec<Combinator>,
    },
}

impl ConditionExpr {
    /// The vacuous expression, which always holds
    pub fn empty() -> Self {
        ConditionExpr::Group {
            operands: Vec::new(),
            combinators: Vec::new(),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Equal, or "list contains" for list attributes (=)
    Equal,
    /// Not equal, or "list lacks" for list attributes (!=)
    NotEqual,
    /// Includes any (?)
    IncludesAny,
    /// Excludes all (!)
    ExcludesAll,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Operator::Greater),
            "<" => Some(Operator::Less),
            ">=" => Some(Operator::GreaterEqual),
            "<=" => Some(Operator::LessEqual),
            "=" => Some(Operator::Equal),
            "!=" => Some(Operator::NotEqual),
            "?" => Some(Operator::IncludesAny),
            "!" => Some(Operator::ExcludesAll),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::IncludesAny => "?",
            Operator::ExcludesAll => "!",
        }
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Greater | Operator::Less | Operator::GreaterEqual | Operator::LessEqual
        )
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Integer(i32),
    List(SmallVec<[String; 4]>),
}

/// A single comparison `<code><operator><value>`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub attribute: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '>' | '<' | '=' | '!' | '?')
}

impl Comparison {
    /// Parse an atom. The atom has already had its whitespace stripped outside
    /// list literals.
    pub fn parse(atom: &str) -> Result<Self> {
        let malformed = || RestartError::MalformedCondition(atom.to_string());

        let op_pos = atom.find(is_operator_char).ok_or_else(malformed)?;
        let attribute = &atom[..op_pos];
        if attribute.is_empty()
            || !attribute
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(malformed());
        }

        // One operator char, plus a trailing '=' if present
        let rest = &atom[op_pos..];
        let symbol_len = if rest[1..].starts_with('=') { 2 } else { 1 };
        let symbol = &rest[..symbol_len];
        let operator =
            Operator::from_symbol(symbol).ok_or_else(|| RestartError::UnknownOperator {
                operator: symbol.to_string(),
                condition: atom.to_string(),
            })?;

        let value = parse_value(&rest[symbol_len..]).ok_or_else(malformed)?;

        if operator.is_ordering() && matches!(value, ConditionValue::List(_)) {
            return Err(RestartError::TypeMismatch(format!(
                "{} cannot compare against a list",
                atom
            )));
        }

        Ok(Comparison {
            attribute: attribute.to_string(),
            operator,
            value,
        })
    }
}

fn parse_value(raw: &str) -> Option<ConditionValue> {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if inner.contains(['[', ']']) {
            return None;
        }
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        return Some(ConditionValue::List(items));
    }

    raw.parse::<i32>().ok().map(ConditionValue::Integer)
}
