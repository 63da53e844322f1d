//! Formula text handling.
//!
//! Contains the formula normalizer used before formulas are embedded in
//! generated text, a small lexer that splits formulas into identifier, number
//! and operator tokens, and identifier-aware symbol substitution built on top
//! of that token stream.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

/// Characters that the normalizer surrounds with exactly one space.
const SPACED_CHARACTERS: [char; 7] = ['(', ')', '*', '/', '+', '-', ','];

lazy_static! {
    static ref NUMBER: Regex =
        Regex::new(r"^(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("valid number pattern");
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("valid identifier pattern");
    static ref SPLIT_EXPONENT: Regex =
        Regex::new(r"\b(\d+(?:\.\d*)?)e - (\d)").expect("valid exponent pattern");
}

/// A lexical token of a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaToken {
    /// Numeric literal, as written.
    Number(String),
    /// Symbol or function name.
    Identifier(String),
    /// Arithmetic operator (`+ - * / ^ % **`).
    Operator(String),
    LParen,
    RParen,
    Comma,
    /// A run of whitespace.
    Whitespace(String),
    /// Anything the lexer does not recognize.
    Other(char),
}

impl FormulaToken {
    /// The source text of the token.
    pub fn text(&self) -> String {
        match self {
            FormulaToken::Number(s)
            | FormulaToken::Identifier(s)
            | FormulaToken::Operator(s)
            | FormulaToken::Whitespace(s) => s.clone(),
            FormulaToken::LParen => "(".into(),
            FormulaToken::RParen => ")".into(),
            FormulaToken::Comma => ",".into(),
            FormulaToken::Other(c) => c.to_string(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, FormulaToken::Whitespace(_))
    }
}

/// Splits a formula into tokens. Concatenating the text of all tokens
/// reproduces the input exactly.
pub fn tokenize(formula: &str) -> Vec<FormulaToken> {
    let mut tokens = Vec::new();
    let mut rest = formula;

    while let Some(c) = rest.chars().next() {
        let (token, len) = if c.is_whitespace() {
            let len = rest
                .find(|ch: char| !ch.is_whitespace())
                .unwrap_or(rest.len());
            (FormulaToken::Whitespace(rest[..len].to_string()), len)
        } else if let Some(m) = NUMBER.find(rest) {
            (FormulaToken::Number(m.as_str().to_string()), m.end())
        } else if let Some(m) = IDENTIFIER.find(rest) {
            (FormulaToken::Identifier(m.as_str().to_string()), m.end())
        } else if rest.starts_with("**") {
            (FormulaToken::Operator("**".into()), 2)
        } else {
            let token = match c {
                '+' | '-' | '*' | '/' | '^' | '%' => FormulaToken::Operator(c.to_string()),
                '(' => FormulaToken::LParen,
                ')' => FormulaToken::RParen,
                ',' => FormulaToken::Comma,
                other => FormulaToken::Other(other),
            };
            (token, c.len_utf8())
        };

        tokens.push(token);
        rest = &rest[len..];
    }

    tokens
}

/// Replaces every identifier token found in `replacements` by its mapped text.
///
/// Only whole identifiers are replaced, so `k1` never matches inside `k10`
/// or `xk1`.
pub fn substitute_identifiers(formula: &str, replacements: &HashMap<String, String>) -> String {
    tokenize(formula)
        .into_iter()
        .map(|token| match token {
            FormulaToken::Identifier(ref id) => replacements
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.clone()),
            other => other.text(),
        })
        .collect()
}

/// Canonical textual form of a number (`1` becomes `1.0`, `3e-5` stays `3e-5`).
pub fn format_number(value: f64) -> String {
    format!("{:?}", value)
}

/// Canonical form of a number that always carries a decimal point, used for
/// literals that must read as floating point in every target syntax.
pub fn format_decimal(value: f64) -> String {
    let text = format_number(value);
    if !value.is_finite() || text.contains('.') {
        return text;
    }

    match text.find('e') {
        Some(pos) => format!("{}.0{}", &text[..pos], &text[pos..]),
        None => format!("{}.0", text),
    }
}

/// Normalizes spacing and numeric literals of a formula.
///
/// Every one of `( ) * / + - ,` is surrounded by exactly one space, runs of
/// whitespace are collapsed, and every standalone numeric token is rewritten
/// in canonical form. Exponents split apart by the spacing (`3e - 5`) are
/// joined back together. Tokens that fail to parse are kept as they are.
pub fn normalize(formula: &str) -> String {
    let mut spaced = String::with_capacity(formula.len() * 2);
    for c in formula.chars() {
        if SPACED_CHARACTERS.contains(&c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let repaired = SPLIT_EXPONENT.replace_all(&collapsed, "${1}e-${2}");

    let rewritten = repaired
        .split(' ')
        .map(normalize_token)
        .collect::<Vec<_>>()
        .join(" ");

    // Rewritten literals such as `.5` -> `0.5` can complete a split exponent
    SPLIT_EXPONENT
        .replace_all(&rewritten, "${1}e-${2}")
        .into_owned()
}

fn normalize_token(token: &str) -> String {
    let looks_numeric = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');

    if !looks_numeric {
        return token.to_string();
    }

    match token.parse::<f64>() {
        Ok(value) => format_number(value),
        Err(_) => token.to_string(),
    }
}
