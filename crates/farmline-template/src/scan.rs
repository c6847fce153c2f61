//! Template tokenizer.
//!
//! Turns a template string into [`Node`]s. Two modes exist: the strict mode
//! validates bracket structure and supports escaping, the lenient mode
//! reproduces the historical character scanner exactly (no escaping, a
//! dangling `[` captures to end of string, a bare `]` is literal).

use crate::ast::Node;
use thiserror::Error;

/// Template parse error (strict mode only).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `[` was never closed by a matching `]`.
    #[error("unclosed placeholder starting at byte {0}")]
    UnclosedPlaceholder(usize),

    /// A `]` appeared outside any placeholder. Use `]]` for a literal `]`.
    #[error("unexpected ']' at byte {0}")]
    UnexpectedClose(usize),
}

/// Scanner mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Escaping via `[[` / `]]`; malformed brackets are errors.
    Strict,
    /// Historical behavior; cannot fail.
    Lenient,
}

/// Scan a template string into nodes.
///
/// Adjacent literal characters collapse into a single [`Node::Literal`];
/// empty literals are never emitted.
pub fn scan(source: &str, mode: Mode) -> Result<Vec<Node>, TemplateError> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '[' => {
                if mode == Mode::Strict && matches!(chars.peek(), Some((_, '['))) {
                    chars.next();
                    literal.push('[');
                    continue;
                }
                flush_literal(&mut nodes, &mut literal);

                let mut key = String::new();
                let mut closed = false;
                for (_, k) in chars.by_ref() {
                    if k == ']' {
                        closed = true;
                        break;
                    }
                    key.push(k);
                }

                if !closed && mode == Mode::Strict {
                    return Err(TemplateError::UnclosedPlaceholder(pos));
                }
                // Lenient: the dangling capture still becomes a placeholder,
                // matching the scanner this replaces.
                nodes.push(Node::Placeholder(key));
            }
            ']' => match mode {
                Mode::Strict => {
                    if matches!(chars.peek(), Some((_, ']'))) {
                        chars.next();
                        literal.push(']');
                    } else {
                        return Err(TemplateError::UnexpectedClose(pos));
                    }
                }
                Mode::Lenient => literal.push(']'),
            },
            _ => literal.push(c),
        }
    }

    flush_literal(&mut nodes, &mut literal);
    Ok(nodes)
}

fn flush_literal(nodes: &mut Vec<Node>, literal: &mut String) {
    if !literal.is_empty() {
        nodes.push(Node::Literal(std::mem::take(literal)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_mixed() {
        let nodes = scan("out/[shot]_[cam].exr", Mode::Strict).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Literal("out/".to_string()),
                Node::Placeholder("shot".to_string()),
                Node::Literal("_".to_string()),
                Node::Placeholder("cam".to_string()),
                Node::Literal(".exr".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_empty_placeholder() {
        let nodes = scan("a[]b", Mode::Strict).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Literal("a".to_string()),
                Node::Placeholder(String::new()),
                Node::Literal("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_strict_escapes() {
        let nodes = scan("[[x]] [k]", Mode::Strict).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Literal("[x] ".to_string()),
                Node::Placeholder("k".to_string()),
            ]
        );
    }

    #[test]
    fn test_strict_errors() {
        assert_eq!(
            scan("a[bc", Mode::Strict),
            Err(TemplateError::UnclosedPlaceholder(1))
        );
        assert_eq!(
            scan("ab]c", Mode::Strict),
            Err(TemplateError::UnexpectedClose(2))
        );
    }

    #[test]
    fn test_lenient_dangling_capture() {
        let nodes = scan("a[bc", Mode::Lenient).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Literal("a".to_string()),
                Node::Placeholder("bc".to_string()),
            ]
        );
    }

    #[test]
    fn test_lenient_nested_open_is_captured() {
        // The historical scanner captured a second '[' as part of the key.
        let nodes = scan("[[k]", Mode::Lenient).unwrap();
        assert_eq!(nodes, vec![Node::Placeholder("[k".to_string())]);
    }

    #[test]
    fn test_lenient_bare_close() {
        let nodes = scan("a]b", Mode::Lenient).unwrap();
        assert_eq!(nodes, vec![Node::Literal("a]b".to_string())]);
    }

    #[test]
    fn test_multibyte_literals() {
        let nodes = scan("Küche/[raum]", Mode::Strict).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Literal("Küche/".to_string()),
                Node::Placeholder("raum".to_string()),
            ]
        );
    }
}
