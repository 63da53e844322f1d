//! Translators between formula dialects.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CompileError;
use crate::expression::{CPrinter, Expression, HEAVISIDE_WARNING};
use crate::formula::normalize;

lazy_static! {
    // Operands are restricted to identifiers, digits, spaces and `/`.
    static ref POW_CALL: Regex =
        Regex::new(r"pow\s?\(\s?([A-Z_a-z0-9\s/]*),\s?([A-Z_a-z0-9\s/]*)\)")
            .expect("valid pow pattern");
}

/// Cleans a formula before it is embedded in generated text.
pub fn clean_formula(formula: &str) -> String {
    normalize(formula)
}

/// Renders expressions as C code, dropping the Heaviside warning block.
pub fn conv_to_cstr(expressions: &[Expression]) -> Result<Vec<String>, CompileError> {
    conv_to_cstr_with(&CPrinter::new(), expressions)
}

/// Like [`conv_to_cstr`] but with a configured printer.
pub fn conv_to_cstr_with(
    printer: &CPrinter,
    expressions: &[Expression],
) -> Result<Vec<String>, CompileError> {
    expressions
        .iter()
        .map(|expr| {
            printer
                .print(expr)
                .map(|code| code.replace(HEAVISIDE_WARNING, ""))
        })
        .collect()
}

/// Translates C style power syntax into MATLAB syntax.
///
/// Whitespace is stripped, `pow(a, b)` becomes `(a)^(b)` and `**` becomes
/// `^`. Only `pow` calls whose operands consist of letters, digits,
/// underscores and `/` are rewritten; any other call is left untouched, so
/// complex operands are not translated.
pub fn math_to_matlab(math: &str) -> String {
    let stripped = math.replace(' ', "");
    let rewritten = POW_CALL.replace_all(&stripped, "(${1})^(${2})");
    rewritten.replace("**", "^")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_formula() {
        assert_eq!(clean_formula("k1*A+1"), "k1 * A + 1.0");
    }

    #[test]
    fn test_conv_to_cstr_strips_heaviside_warning() {
        let expressions = vec![
            Expression::parse("k*heaviside(t - 1)").unwrap(),
            Expression::parse("k1*A**2").unwrap(),
        ];
        let c = conv_to_cstr(&expressions).unwrap();

        assert_eq!(c, vec!["k * Heaviside(t - 1.0)", "k1 * pow(A, 2.0)"]);
    }

    #[test]
    fn test_conv_to_cstr_propagates_rejection() {
        let expressions = vec![Expression::parse("erf(x)").unwrap()];
        assert!(matches!(
            conv_to_cstr(&expressions),
            Err(CompileError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_math_to_matlab() {
        assert_eq!(math_to_matlab("pow(A, k3) * B"), "(A)^(k3)*B");
        assert_eq!(math_to_matlab("B ** k3"), "B^k3");
        assert_eq!(math_to_matlab("pow(x/y,2)"), "(x/y)^(2)");
    }

    #[test]
    fn test_math_to_matlab_leaves_complex_operands() {
        assert_eq!(math_to_matlab("pow(A, 2.0)"), "pow(A,2.0)");
        assert_eq!(math_to_matlab("pow(f(x), 2)"), "pow(f(x),2)");
    }
}
