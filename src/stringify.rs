//! Expression stringification for generated Python modules.
//!
//! The generated module must rebuild formula *text* at runtime, not evaluate
//! it. A formula is therefore split into quoted literal pieces and unquoted
//! runtime references (such as `reactions['r1']['rate']`), joined by string
//! concatenation.

use std::collections::HashMap;
use std::fmt;

use crate::formula::{tokenize, FormulaToken};

/// One piece of a stringified formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Text emitted as a quoted string literal.
    Literal(String),
    /// Expression evaluated at runtime to a string.
    Reference(String),
}

/// A formula expressed as a concatenation of pieces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stringified {
    pub pieces: Vec<Piece>,
}

impl Stringified {
    /// Reproduces the runtime concatenation, resolving references through
    /// `resolve`.
    pub fn concat_with<F>(&self, resolve: F) -> String
    where
        F: Fn(&str) -> String,
    {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text.clone(),
                Piece::Reference(reference) => resolve(reference),
            })
            .collect()
    }
}

impl fmt::Display for Stringified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pieces.is_empty() {
            return write!(f, "'0'");
        }

        let rendered: Vec<String> = self
            .pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => quote(text),
                Piece::Reference(reference) => reference.clone(),
            })
            .collect();
        write!(f, "{}", rendered.join(" + "))
    }
}

/// Quotes text as a single-quoted Python string literal.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Stringifies a formula.
///
/// Numeric literals keep a preceding unary minus attached, binary operators
/// become spaced operator literals (`' + '`, `' - '`, `' * '`), and every
/// identifier found in `references` is replaced by its runtime reference.
/// All other symbols are emitted as literals.
///
/// # Arguments
///
/// * `formula` - The formula text, e.g. an assembled flux formula
/// * `references` - Identifiers to emit as runtime references
///
/// # Returns
///
/// * `Stringified` - The pieces of the formula; `"0"` yields a single `'0'`
pub fn stringify(formula: &str, references: &HashMap<String, String>) -> Stringified {
    let tokens: Vec<FormulaToken> = tokenize(formula)
        .into_iter()
        .filter(|t| !t.is_whitespace())
        .collect();

    let mut pieces = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let unary = match i.checked_sub(1).map(|p| &tokens[p]) {
            None => true,
            Some(FormulaToken::Operator(_) | FormulaToken::LParen | FormulaToken::Comma) => true,
            _ => false,
        };

        match &tokens[i] {
            FormulaToken::Operator(op) if unary && (op == "-" || op == "+") => {
                match tokens.get(i + 1) {
                    Some(FormulaToken::Number(number)) => {
                        let sign = if op == "-" { "-" } else { "" };
                        pieces.push(Piece::Literal(format!("{}{}", sign, number)));
                        i += 1;
                    }
                    _ => pieces.push(Piece::Literal(op.clone())),
                }
            }
            FormulaToken::Operator(op) => pieces.push(Piece::Literal(format!(" {} ", op))),
            FormulaToken::Number(number) => pieces.push(Piece::Literal(number.clone())),
            FormulaToken::Identifier(id) => match references.get(id) {
                Some(reference) => pieces.push(Piece::Reference(reference.clone())),
                None => pieces.push(Piece::Literal(id.clone())),
            },
            FormulaToken::Comma => pieces.push(Piece::Literal(", ".to_string())),
            other => pieces.push(Piece::Literal(other.text())),
        }
        i += 1;
    }

    Stringified { pieces }
}
