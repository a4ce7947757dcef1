//! Condition string parser
//!
//! Grammar: comparisons joined by `&` / `|`, optionally grouped in
//! parentheses. There is no precedence between `&` and `|`; the evaluator
//! walks each group left to right. Whitespace outside list literals is
//! ignored.
//!
//! Parsing never fails. A group whose structure is broken (dangling or
//! doubled combinators, adjacent operands, unbalanced parentheses) collapses
//! into an [`ConditionExpr::Atom`] holding its raw text, which the evaluator
//! then rejects as malformed. So does a group nested more than
//! [`MAX_DEPTH`] levels deep, which keeps the tree shallow enough for the
//! recursive evaluator.

use crate::condition::ast::{Combinator, ConditionExpr};

/// Deepest parenthesised group that still parses as a group
pub const MAX_DEPTH: usize = 64;

/// Parse a condition string into an expression tree
pub fn parse(condition: &str) -> ConditionExpr {
    let stripped = strip_whitespace(condition);
    let tokens = tokenize(&stripped);
    build(&stripped, &tokens)
}

/// Remove whitespace outside `[...]` list literals
fn strip_whitespace(condition: &str) -> String {
    let mut out = String::with_capacity(condition.len());
    let mut in_list = false;
    for c in condition.chars() {
        match c {
            '[' => in_list = true,
            ']' => in_list = false,
            c if c.is_whitespace() && !in_list => continue,
            _ => {}
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Byte range of an atom in the stripped source
    Atom(usize, usize),
    Combinator(Combinator),
    Open(usize),
    Close(usize),
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_list = false;

    fn flush(tokens: &mut Vec<Token>, start: &mut Option<usize>, end: usize) {
        if let Some(s) = start.take() {
            tokens.push(Token::Atom(s, end));
        }
    }

    for (i, c) in source.char_indices() {
        if in_list {
            if c == ']' {
                in_list = false;
            }
            continue;
        }
        match c {
            '(' => {
                flush(&mut tokens, &mut start, i);
                tokens.push(Token::Open(i));
            }
            ')' => {
                flush(&mut tokens, &mut start, i);
                tokens.push(Token::Close(i));
            }
            '&' => {
                flush(&mut tokens, &mut start, i);
                tokens.push(Token::Combinator(Combinator::And));
            }
            '|' => {
                flush(&mut tokens, &mut start, i);
                tokens.push(Token::Combinator(Combinator::Or));
            }
            _ => {
                if c == '[' {
                    in_list = true;
                }
                start.get_or_insert(i);
            }
        }
    }
    flush(&mut tokens, &mut start, source.len());

    tokens
}

/// One open group on the parse stack
struct Frame {
    /// Byte offset of the opening parenthesis (0 for the root)
    start: usize,
    operands: Vec<ConditionExpr>,
    combinators: Vec<Combinator>,
    broken: bool,
    /// Nested past `MAX_DEPTH`; contents are skipped
    too_deep: bool,
}

impl Frame {
    fn new(start: usize) -> Self {
        Self {
            start,
            operands: Vec::new(),
            combinators: Vec::new(),
            broken: false,
            too_deep: false,
        }
    }

    fn push_operand(&mut self, expr: ConditionExpr) {
        if self.operands.len() > self.combinators.len() {
            // two operands with no combinator between them
            self.broken = true;
        }
        self.operands.push(expr);
    }

    fn push_combinator(&mut self, combinator: Combinator) {
        if self.operands.len() == self.combinators.len() {
            self.broken = true;
        }
        self.combinators.push(combinator);
    }

    /// Close the group; `raw` is its source text for the degraded case
    fn finish(mut self, raw: &str) -> ConditionExpr {
        let well_formed = !self.broken
            && (self.operands.is_empty() && self.combinators.is_empty()
                || self.combinators.len() + 1 == self.operands.len());
        if !well_formed {
            return ConditionExpr::Atom(raw.to_string());
        }
        if self.operands.len() == 1 {
            return self.operands.remove(0);
        }
        ConditionExpr::Group {
            operands: self.operands,
            combinators: self.combinators,
        }
    }
}

fn build(source: &str, tokens: &[Token]) -> ConditionExpr {
    let mut stack = vec![Frame::new(0)];

    for token in tokens {
        match *token {
            Token::Atom(start, end) => {
                if let Some(frame) = stack.last_mut().filter(|f| !f.too_deep) {
                    frame.push_operand(ConditionExpr::Atom(source[start..end].to_string()));
                }
            }
            Token::Combinator(combinator) => {
                if let Some(frame) = stack.last_mut().filter(|f| !f.too_deep) {
                    frame.push_combinator(combinator);
                }
            }
            Token::Open(pos) => {
                let mut frame = Frame::new(pos);
                frame.too_deep = stack.len() > MAX_DEPTH;
                stack.push(frame);
            }
            Token::Close(pos) => {
                if stack.len() == 1 {
                    return ConditionExpr::Atom(source.to_string());
                }
                if let Some(frame) = stack.pop() {
                    let Some(parent) = stack.last_mut() else {
                        continue;
                    };
                    if parent.too_deep {
                        continue;
                    }
                    let raw = &source[frame.start..=pos];
                    let group = if frame.too_deep {
                        ConditionExpr::Atom(raw.to_string())
                    } else {
                        frame.finish(raw)
                    };
                    parent.push_operand(group);
                }
            }
        }
    }

    if stack.len() != 1 {
        return ConditionExpr::Atom(source.to_string());
    }
    match stack.pop() {
        Some(root) => root.finish(source),
        None => ConditionExpr::empty(),
    }
}
