//! File and identifier names derived from free-form model names.

use lazy_static::lazy_static;
use regex::Regex;

/// Length after which no further name parts are appended.
const MAX_NAME_LENGTH: usize = 20;

lazy_static! {
    static ref UNDERSCORE_RUN: Regex = Regex::new(r"_+").expect("valid underscore pattern");
    static ref NON_IDENTIFIER: Regex =
        Regex::new(r"[^A-Za-z0-9_]").expect("valid identifier pattern");
}

/// Derives a short, filesystem-safe name from a model name.
///
/// Separators (`space - + / \`) become underscores, runs of underscores are
/// collapsed and parts are appended until the accumulated name exceeds 20
/// characters. The part crossing the limit is kept whole.
///
/// ```
/// use odegen::naming::sanitize_name;
///
/// assert_eq!(
///     sanitize_name("Epo-EpoR Model (Becker et al. 2010)"),
///     "Epo_EpoR_Model_(Becker"
/// );
/// ```
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '-' | '+' | '/' | '\\' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    let collapsed = UNDERSCORE_RUN.replace_all(&replaced, "_");

    let mut short_name = String::new();
    for part in collapsed.split('_') {
        short_name.push('_');
        short_name.push_str(part);
        if short_name.chars().count() > MAX_NAME_LENGTH {
            break;
        }
    }

    short_name[1..].to_string()
}

/// Maps a sanitized name onto a valid Python identifier.
pub fn python_identifier(name: &str) -> String {
    let ident = NON_IDENTIFIER.replace_all(name, "_");
    let ident = UNDERSCORE_RUN.replace_all(&ident, "_");
    let ident = ident.trim_end_matches('_');

    match ident.chars().next() {
        None => "model".to_string(),
        Some(c) if c.is_ascii_digit() => format!("model_{}", ident),
        Some(_) => ident.to_string(),
    }
}
