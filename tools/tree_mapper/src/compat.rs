//! Text conventions of the legacy cast-to-yaml generator, applied to the source text of array
//! lengths, enumerator values and initializers when compat mode is on.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*").unwrap());
static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"0[xX]0*([0-9A-Fa-f]+)").unwrap());
static OPERATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*(<<|\+|-)\s*").unwrap());
static ENCLOSING_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\((.*)\)$").unwrap());

/// Normalizes an expression the way cast-to-yaml printed it: `", "` after commas, lower-case hex
/// literals without leading zeros, spaces around `<<`, `+` and `-`, and no enclosing parentheses.
///
/// This works on text, not on a parsed expression, so `(a) + (b)` loses its outer parentheses
/// too.
pub fn cast_format(text: &str) -> String {
    let text = COMMA.replace_all(text, ", ");
    let text = HEX.replace_all(&text, |caps: &Captures| {
        format!("0x{}", caps[1].to_ascii_lowercase())
    });
    // A sign at the very start is unary and keeps its operand attached.
    let text = OPERATOR.replace_all(&text, |caps: &Captures| match caps.get(0) {
        Some(m) if m.start() == 0 => m.as_str().to_string(),
        _ => format!(" {} ", &caps[1]),
    });
    ENCLOSING_PARENS.replace(&text, "$1").into_owned()
}
