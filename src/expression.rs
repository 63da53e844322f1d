//! Expression trees for ODE right-hand sides.
//!
//! Formulas are parsed with `meval`, whose parser yields the expression in
//! reverse polish notation. The RPN stream is folded into an [`Expression`]
//! tree that the C printer can walk with full knowledge of operator precedence.

use std::collections::{HashMap, HashSet};
use std::fmt;

use meval::tokenizer::{Operation, Token};

use crate::error::CompileError;
use crate::formula::format_decimal;

/// Comment block emitted in front of expressions using functions without a C
/// counterpart.
pub const HEAVISIDE_WARNING: &str = "// Not supported in C:\n// Heaviside\n";

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 2,
            BinaryOp::Pow => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "^",
        }
    }
}

/// A parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    Symbol(String),
    Neg(Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

/// Precedence of unary minus, between products and powers.
const NEG_PRECEDENCE: u8 = 3;
/// Precedence of atoms and calls.
const ATOM_PRECEDENCE: u8 = 5;

impl Expression {
    /// Parses infix formula text. Python style `**` is accepted as power.
    pub fn parse(formula: &str) -> Result<Self, CompileError> {
        let source = formula.replace("**", "^");
        let parsed: meval::Expr =
            source
                .parse()
                .map_err(|e: meval::Error| CompileError::UnsupportedExpression {
                    expression: formula.to_string(),
                    reason: e.to_string(),
                })?;

        let unsupported = |reason: &str| CompileError::UnsupportedExpression {
            expression: formula.to_string(),
            reason: reason.to_string(),
        };

        let mut stack: Vec<Expression> = Vec::new();
        for token in parsed.iter() {
            match token {
                Token::Number(value) => stack.push(Expression::Number(*value)),
                Token::Var(name) => stack.push(Expression::Symbol(name.clone())),
                Token::Unary(op) => {
                    let operand = stack.pop().ok_or_else(|| unsupported("missing operand"))?;
                    match op {
                        Operation::Plus => stack.push(operand),
                        Operation::Minus => stack.push(Expression::Neg(Box::new(operand))),
                        _ => return Err(unsupported("unsupported unary operator")),
                    }
                }
                Token::Binary(op) => {
                    let rhs = stack.pop().ok_or_else(|| unsupported("missing operand"))?;
                    let lhs = stack.pop().ok_or_else(|| unsupported("missing operand"))?;
                    let op = match op {
                        Operation::Plus => BinaryOp::Add,
                        Operation::Minus => BinaryOp::Sub,
                        Operation::Times => BinaryOp::Mul,
                        Operation::Div => BinaryOp::Div,
                        Operation::Rem => BinaryOp::Rem,
                        Operation::Pow => BinaryOp::Pow,
                    };
                    stack.push(Expression::Binary(op, Box::new(lhs), Box::new(rhs)));
                }
                Token::Func(name, nargs) => {
                    let nargs = nargs.unwrap_or(1);
                    if stack.len() < nargs {
                        return Err(unsupported("missing function argument"));
                    }
                    let args = stack.split_off(stack.len() - nargs);
                    stack.push(Expression::Call(name.clone(), args));
                }
                _ => return Err(unsupported("unexpected token")),
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(expr), true) => Ok(expr),
            _ => Err(unsupported("malformed expression")),
        }
    }

    /// All symbols referenced by the expression.
    pub fn symbols(&self) -> HashSet<String> {
        let mut symbols = HashSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut HashSet<String>) {
        match self {
            Expression::Number(_) => {}
            Expression::Symbol(name) => {
                symbols.insert(name.clone());
            }
            Expression::Neg(inner) => inner.collect_symbols(symbols),
            Expression::Binary(_, lhs, rhs) => {
                lhs.collect_symbols(symbols);
                rhs.collect_symbols(symbols);
            }
            Expression::Call(_, args) => args.iter().for_each(|a| a.collect_symbols(symbols)),
        }
    }

    /// Whether the top level of the expression is a sum, a difference or a
    /// negation, i.e. it must be grouped before being scaled or subtracted.
    pub fn is_additive(&self) -> bool {
        matches!(
            self,
            Expression::Neg(_) | Expression::Binary(BinaryOp::Add | BinaryOp::Sub, _, _)
        )
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Number(v) if *v < 0.0 => NEG_PRECEDENCE,
            Expression::Number(_) | Expression::Symbol(_) | Expression::Call(_, _) => {
                ATOM_PRECEDENCE
            }
            Expression::Neg(_) => NEG_PRECEDENCE,
            Expression::Binary(op, _, _) => op.precedence(),
        }
    }
}

impl fmt::Display for Expression {
    /// Infix rendering with `^` as power operator and minimal parentheses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(v) => write!(f, "{}", format_decimal(*v)),
            Expression::Symbol(name) => write!(f, "{}", name),
            Expression::Neg(inner) => {
                if inner.precedence() <= NEG_PRECEDENCE {
                    write!(f, "-({})", inner)
                } else {
                    write!(f, "-{}", inner)
                }
            }
            Expression::Binary(op, lhs, rhs) => {
                let (left, right) = operand_grouping(*op, lhs, rhs);
                write_grouped(f, lhs, left)?;
                write!(f, " {} ", op.symbol())?;
                write_grouped(f, rhs, right)
            }
            Expression::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_grouped(f: &mut fmt::Formatter<'_>, expr: &Expression, grouped: bool) -> fmt::Result {
    if grouped {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// Decides which operands of a binary operator need parentheses.
fn operand_grouping(op: BinaryOp, lhs: &Expression, rhs: &Expression) -> (bool, bool) {
    let prec = op.precedence();
    match op {
        BinaryOp::Pow => (lhs.precedence() <= prec, rhs.precedence() < prec),
        BinaryOp::Sub | BinaryOp::Div | BinaryOp::Rem => {
            (lhs.precedence() < prec, rhs.precedence() <= prec)
        }
        BinaryOp::Add | BinaryOp::Mul => (lhs.precedence() < prec, rhs.precedence() < prec),
    }
}

/// Renders expressions as C source text.
///
/// Without a symbol table identifiers are emitted unchanged. With one, every
/// symbol must be mapped, otherwise rendering fails with an unresolved
/// reference.
#[derive(Debug, Clone, Default)]
pub struct CPrinter {
    symbols: Option<HashMap<String, String>>,
}

impl CPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printer renaming symbols through `symbols`.
    pub fn with_symbols(symbols: HashMap<String, String>) -> Self {
        Self {
            symbols: Some(symbols),
        }
    }

    /// Renders an expression. Functions without a C counterpart that can
    /// still be passed through are announced by a leading comment block.
    pub fn print(&self, expr: &Expression) -> Result<String, CompileError> {
        let mut unsupported = Vec::new();
        let code = self.render(expr, &mut unsupported)?;

        if unsupported.is_empty() {
            return Ok(code);
        }

        let mut header = String::from("// Not supported in C:\n");
        for name in unsupported {
            header.push_str(&format!("// {}\n", name));
        }
        Ok(header + &code)
    }

    fn render(&self, expr: &Expression, unsupported: &mut Vec<String>) -> Result<String, CompileError> {
        let code = match expr {
            Expression::Number(v) => c_number(*v),
            Expression::Symbol(name) => self.symbol(name)?,
            Expression::Neg(inner) => {
                let rendered = self.render(inner, unsupported)?;
                if inner.precedence() <= NEG_PRECEDENCE {
                    format!("-({})", rendered)
                } else {
                    format!("-{}", rendered)
                }
            }
            Expression::Binary(BinaryOp::Pow, lhs, rhs) => format!(
                "pow({}, {})",
                self.render(lhs, unsupported)?,
                self.render(rhs, unsupported)?
            ),
            Expression::Binary(BinaryOp::Rem, lhs, rhs) => format!(
                "fmod({}, {})",
                self.render(lhs, unsupported)?,
                self.render(rhs, unsupported)?
            ),
            Expression::Binary(op, lhs, rhs) => {
                let (left, right) = operand_grouping(*op, lhs, rhs);
                let lhs = self.render(lhs, unsupported)?;
                let rhs = self.render(rhs, unsupported)?;
                format!(
                    "{} {} {}",
                    group_if(lhs, left),
                    op.symbol(),
                    group_if(rhs, right)
                )
            }
            Expression::Call(name, args) => {
                let c_name = match c_function(name) {
                    Some(c_name) => c_name,
                    None if name.eq_ignore_ascii_case("heaviside") => {
                        if !unsupported.iter().any(|n| n == "Heaviside") {
                            unsupported.push("Heaviside".to_string());
                        }
                        "Heaviside"
                    }
                    None => {
                        return Err(CompileError::UnsupportedExpression {
                            expression: expr.to_string(),
                            reason: format!("function '{}' has no C counterpart", name),
                        })
                    }
                };
                let args = args
                    .iter()
                    .map(|a| self.render(a, unsupported))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("{}({})", c_name, args.join(", "))
            }
        };

        Ok(code)
    }

    fn symbol(&self, name: &str) -> Result<String, CompileError> {
        match &self.symbols {
            None => Ok(name.to_string()),
            Some(table) => {
                table
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CompileError::UnresolvedReference {
                        id: name.to_string(),
                        mapping: "C symbol table".to_string(),
                    })
            }
        }
    }
}

fn group_if(code: String, grouped: bool) -> String {
    if grouped {
        format!("({})", code)
    } else {
        code
    }
}

pub(crate) fn c_number(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}INFINITY", sign)
    } else {
        format_decimal(value)
    }
}

fn c_function(name: &str) -> Option<&'static str> {
    let mapped = match name {
        "exp" => "exp",
        "log" | "ln" => "log",
        "log10" => "log10",
        "sqrt" => "sqrt",
        "abs" | "fabs" => "fabs",
        "sin" => "sin",
        "cos" => "cos",
        "tan" => "tan",
        "asin" => "asin",
        "acos" => "acos",
        "atan" => "atan",
        "atan2" => "atan2",
        "sinh" => "sinh",
        "cosh" => "cosh",
        "tanh" => "tanh",
        "floor" => "floor",
        "ceil" => "ceil",
        "pow" => "pow",
        "max" => "fmax",
        "min" => "fmin",
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(formula: &str) -> String {
        CPrinter::new()
            .print(&Expression::parse(formula).unwrap())
            .unwrap()
    }

    #[test]
    fn test_parse_tree() {
        let expr = Expression::parse("k1*A - k2*B").unwrap();
        assert_eq!(
            expr,
            Expression::Binary(
                BinaryOp::Sub,
                Box::new(Expression::Binary(
                    BinaryOp::Mul,
                    Box::new(Expression::Symbol("k1".into())),
                    Box::new(Expression::Symbol("A".into())),
                )),
                Box::new(Expression::Binary(
                    BinaryOp::Mul,
                    Box::new(Expression::Symbol("k2".into())),
                    Box::new(Expression::Symbol("B".into())),
                )),
            )
        );
    }

    #[test]
    fn test_parse_binary_operators() {
        let ops: Vec<BinaryOp> = ["a + b", "a - b", "a * b", "a / b", "a % b", "a ^ b"]
            .iter()
            .map(|formula| match Expression::parse(formula).unwrap() {
                Expression::Binary(op, _, _) => op,
                other => panic!("Expected a binary expression, got {:?}", other),
            })
            .collect();

        assert_eq!(
            ops,
            vec![
                BinaryOp::Add,
                BinaryOp::Sub,
                BinaryOp::Mul,
                BinaryOp::Div,
                BinaryOp::Rem,
                BinaryOp::Pow
            ]
        );
        assert_eq!(c("a % b"), "fmod(a, b)");
    }

    #[test]
    fn test_c_precedence() {
        assert_eq!(c("k1*A - k2*B"), "k1 * A - k2 * B");
        assert_eq!(c("a - (b - c)"), "a - (b - c)");
        assert_eq!(c("(a + b)*c"), "(a + b) * c");
        assert_eq!(c("a/(b*c)"), "a / (b * c)");
        assert_eq!(c("-(a + b)"), "-(a + b)");
    }

    #[test]
    fn test_c_literals_are_floating_point() {
        assert_eq!(c("1/2*x"), "1.0 / 2.0 * x");
        assert_eq!(c("3e-5*k"), "3.0e-5 * k");
    }

    #[test]
    fn test_c_power_and_functions() {
        assert_eq!(c("B**k3"), "pow(B, k3)");
        assert_eq!(c("k1*ln(A) + abs(B)"), "k1 * log(A) + fabs(B)");
        assert_eq!(c("max(A, B)"), "fmax(A, B)");
    }

    #[test]
    fn test_c_heaviside_comment() {
        assert_eq!(
            c("k*heaviside(t - 1)"),
            "// Not supported in C:\n// Heaviside\nk * Heaviside(t - 1.0)"
        );
    }

    #[test]
    fn test_c_unknown_function_is_rejected() {
        let expr = Expression::parse("gamma(x)").unwrap();
        let result = CPrinter::new().print(&expr);
        assert!(matches!(
            result,
            Err(CompileError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_c_symbol_table() {
        let printer = CPrinter::with_symbols(HashMap::from([
            ("A".to_string(), "NV_Ith_S(y, 0)".to_string()),
            ("k1".to_string(), "p[0]".to_string()),
        ]));
        let expr = Expression::parse("-k1*A").unwrap();
        assert_eq!(printer.print(&expr).unwrap(), "-p[0] * NV_Ith_S(y, 0)");

        let missing = Expression::parse("k2*A").unwrap();
        assert!(matches!(
            printer.print(&missing),
            Err(CompileError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_is_additive() {
        assert!(Expression::parse("a + b").unwrap().is_additive());
        assert!(Expression::parse("-a").unwrap().is_additive());
        assert!(!Expression::parse("k1*A").unwrap().is_additive());
        assert!(!Expression::parse("(a + b)*c").unwrap().is_additive());
    }

    #[test]
    fn test_symbols() {
        let symbols = Expression::parse("kon*Epo*EpoR - exp(koff)").unwrap().symbols();
        assert_eq!(symbols.len(), 4);
        assert!(symbols.contains("koff"));
    }
}
