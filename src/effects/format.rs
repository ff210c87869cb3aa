//! Description templates with positional slots
//!
//! Slots look like `{0}` or `{1:.2}` (fixed precision). Any other braced
//! text, or a slot past the end of the arguments, is a format error.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Why a template could not be filled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Slot index has no matching argument
    #[error("no argument for slot {0}")]
    MissingArgument(usize),

    /// Braced text that is not a slot
    #[error("invalid slot '{{{0}}}'")]
    BadSlot(String),

    /// Unbalanced `{` or `}`
    #[error("unbalanced braces")]
    Unbalanced,
}

static SLOT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]*)\}").expect("slot pattern is valid")
});

static SLOT_BODY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?::\.(\d+))?$").expect("slot body pattern is valid")
});

/// A template argument
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
    Number(f64),
    Text(String),
}

impl From<f64> for FormatArg {
    fn from(value: f64) -> Self {
        FormatArg::Number(value)
    }
}

impl From<&str> for FormatArg {
    fn from(value: &str) -> Self {
        FormatArg::Text(value.to_string())
    }
}

impl From<String> for FormatArg {
    fn from(value: String) -> Self {
        FormatArg::Text(value)
    }
}

/// Fill the positional slots of `template`
pub fn format_template(template: &str, args: &[FormatArg]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in SLOT_REGEX.captures_iter(template) {
        let whole = caps.get(0).ok_or(FormatError::Unbalanced)?;
        let body = caps.get(1).map_or("", |m| m.as_str());

        let slot = SLOT_BODY_REGEX
            .captures(body)
            .ok_or_else(|| FormatError::BadSlot(body.to_string()))?;
        let index: usize = slot[1]
            .parse()
            .map_err(|_| FormatError::BadSlot(body.to_string()))?;
        let precision: Option<usize> = slot.get(2).and_then(|p| p.as_str().parse().ok());

        let arg = args.get(index).ok_or(FormatError::MissingArgument(index))?;

        let literal = &template[last..whole.start()];
        if literal.contains(['{', '}']) {
            return Err(FormatError::Unbalanced);
        }
        out.push_str(literal);

        match (arg, precision) {
            (FormatArg::Number(n), Some(p)) => out.push_str(&format!("{:.*}", p, n)),
            (FormatArg::Number(n), None) => out.push_str(&n.to_string()),
            (FormatArg::Text(t), _) => out.push_str(t),
        }
        last = whole.end();
    }

    let tail = &template[last..];
    if tail.contains(['{', '}']) {
        return Err(FormatError::Unbalanced);
    }
    out.push_str(tail);
    Ok(out)
}

/// Fill `template`, falling back to the raw template on any mismatch
pub fn format_or_raw(template: &str, args: &[FormatArg]) -> String {
    format_template(template, args).unwrap_or_else(|_| template.to_string())
}
