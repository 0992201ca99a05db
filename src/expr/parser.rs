//! Condition language parser
//!
//! Parses expressions like:
//! - `field == 'value'`
//! - `score > 0.8`
//! - `a == 'x' and (b > 5 or not c == null)`
//!
//! Precedence from loosest to tightest: `or`, `and`, `not`, parentheses,
//! comparison. Field paths on either side are relative to the bound parameter.

use super::ast::{CompareOp, Expr, Literal, Param};
use super::Predicate;
use crate::error::ParseError;

/// Operators tried in order of length (longest first)
const OPERATORS: [(&str, CompareOp); 7] = [
    ("!=", CompareOp::NotEq),
    (">=", CompareOp::Gte),
    ("<=", CompareOp::Lte),
    ("==", CompareOp::Eq),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
    (" contains ", CompareOp::Contains),
];

/// Words that cannot be used as a field name
const KEYWORDS: [&str; 7] = ["and", "or", "not", "true", "false", "null", "contains"];

/// Parse a condition string into a predicate over a fresh parameter
pub fn parse<T>(input: &str) -> Result<Predicate<T>, ParseError> {
    check_balanced(input)?;
    let param = Param::fresh();
    let body = parse_body(input, &Expr::Param(param))?;
    Ok(Predicate::from_parts(param, body))
}

/// Parse a condition string into a body whose field paths hang off `param`
pub fn parse_body(input: &str, param: &Expr) -> Result<Expr, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(inner) = strip_group(input) {
        return parse_body(inner, param);
    }

    // Handle special cases
    if input == "true" {
        return Ok(Expr::True);
    }
    if input == "false" {
        return Ok(Expr::False);
    }

    // Loosest binding first so that `a and b or c` groups as `(a and b) or c`
    if let Some(pos) = find_top_level(input, " or ") {
        let left = parse_body(&input[..pos], param)?;
        let right = parse_body(&input[pos + 4..], param)?;
        return Ok(Expr::Or(Box::new(left), Box::new(right)));
    }
    if let Some(pos) = find_top_level(input, " and ") {
        let left = parse_body(&input[..pos], param)?;
        let right = parse_body(&input[pos + 5..], param)?;
        return Ok(Expr::And(Box::new(left), Box::new(right)));
    }
    if let Some(rest) = strip_not(input) {
        return Ok(Expr::Not(Box::new(parse_body(rest, param)?)));
    }

    parse_comparison(input, param)
}

fn parse_comparison(input: &str, param: &Expr) -> Result<Expr, ParseError> {
    for (op_str, op) in OPERATORS {
        if let Some(pos) = find_top_level(input, op_str) {
            let left = parse_operand(&input[..pos], param)?;
            let right = parse_operand(&input[pos + op_str.len()..], param)?;
            return Ok(left.compare(op, right));
        }
    }

    Err(ParseError::Condition(input.to_string()))
}

fn parse_operand(input: &str, param: &Expr) -> Result<Expr, ParseError> {
    let input = input.trim();

    // Null
    if input == "null" {
        return Ok(Expr::Literal(Literal::Null));
    }

    // Boolean
    if input == "true" {
        return Ok(Expr::Literal(Literal::Boolean(true)));
    }
    if input == "false" {
        return Ok(Expr::Literal(Literal::Boolean(false)));
    }

    // String (single or double quotes)
    if input.len() >= 2
        && ((input.starts_with('\'') && input.ends_with('\''))
            || (input.starts_with('"') && input.ends_with('"')))
    {
        let s = &input[1..input.len() - 1];
        return Ok(Expr::Literal(Literal::String(s.to_string())));
    }

    // Number; `nan` and `inf` are left to be read as field names
    if let Ok(n) = input.parse::<f64>() {
        if n.is_finite() {
            return Ok(Expr::Literal(Literal::Number(n)));
        }
    }

    // Another field on the same candidate
    if is_path(input) {
        return Ok(param.clone().path(input));
    }

    Err(ParseError::Operand(input.to_string()))
}

/// Byte offset of the first occurrence of `needle` outside quotes and parentheses
fn find_top_level(input: &str, needle: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if depth == 0 && input[i..].starts_with(needle) => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// If the whole input is one parenthesised group, return its contents
fn strip_group(input: &str) -> Option<&str> {
    if !input.starts_with('(') || !input.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        // The opening paren closed before the end: `(a) and (b)`
                        return (i == input.len() - 1).then(|| &input[1..i]);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

fn strip_not(input: &str) -> Option<&str> {
    let rest = input.strip_prefix("not")?;
    if rest.starts_with(' ') || rest.starts_with('(') {
        Some(rest)
    } else {
        None
    }
}

fn is_path(input: &str) -> bool {
    !input.is_empty() && input.split('.').all(is_segment)
}

fn is_segment(part: &str) -> bool {
    !part.is_empty()
        && part.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !part.starts_with(|c: char| c.is_ascii_digit())
}

/// Whether `name` reads back as a single field segment
pub(super) fn is_field_name(name: &str) -> bool {
    is_segment(name) && !KEYWORDS.contains(&name)
}

fn check_balanced(input: &str) -> Result<(), ParseError> {
    let mut depth = 0i64;
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(ParseError::Unbalanced(input.to_string()));
                    }
                }
                _ => {}
            },
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(ParseError::Unbalanced(input.to_string()));
    }
    Ok(())
}
