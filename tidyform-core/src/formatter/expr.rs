//! Expression canonicalizers
//!
//! Both functions take an attribute's expression tokens and return tokens that
//! evaluate to the same value. Anything they cannot prove safe is returned
//! untouched.

use crate::rules::LEGACY_COLLECTION_KEYWORDS;
use crate::syntax::{Token, TokenKind};

/// Unwrap `"${expr}"` into `expr`
///
/// Only a quoted template made of exactly one interpolation qualifies. Nested
/// quoted templates inside the interpolation are skipped over, so
/// `"${f("${x}")}"` still unwraps to `f("${x}")`. Multi-line results are
/// wrapped in parentheses so they remain a single expression.
pub fn unwrap_interpolation(tokens: Vec<Token>) -> Vec<Token> {
    let n = tokens.len();
    if n < 5 {
        return tokens;
    }

    let delimited = tokens[0].kind == TokenKind::OQuote
        && tokens[1].kind == TokenKind::TemplateInterp
        && tokens[n - 2].kind == TokenKind::TemplateSeqEnd
        && tokens[n - 1].kind == TokenKind::CQuote;
    if !delimited {
        return tokens;
    }

    let interior = &tokens[2..n - 2];
    if !is_single_interpolation(interior) {
        return tokens;
    }

    let trimmed = trim_newlines(interior);
    if trimmed.is_empty() {
        return tokens;
    }

    let multi_line = trimmed.iter().any(Token::ends_line);
    if multi_line && !is_parenthesized(trimmed) {
        let mut wrapped = Vec::with_capacity(trimmed.len() + 2);
        wrapped.push(Token::synthetic(TokenKind::OParen, "("));
        wrapped.extend(trimmed.iter().cloned());
        wrapped.push(Token::synthetic(TokenKind::CParen, ")"));
        return wrapped;
    }

    trimmed.to_vec()
}

/// Upgrade a legacy `variable` type constraint
pub fn canonicalize_type(tokens: Vec<Token>) -> Vec<Token> {
    legacy_type_replacement(&tokens).unwrap_or(tokens)
}

fn legacy_type_replacement(tokens: &[Token]) -> Option<Vec<Token>> {
    match tokens {
        [keyword] if keyword.kind == TokenKind::Ident => {
            if !LEGACY_COLLECTION_KEYWORDS.contains(&keyword.text.as_str()) {
                return None;
            }
            // A collection without an element type accepts any element type
            Some(collection_type(keyword.clone(), "any"))
        }
        [open, literal, close]
            if open.kind == TokenKind::OQuote
                && literal.kind == TokenKind::QuotedLit
                && close.kind == TokenKind::CQuote =>
        {
            // Quoted types predate `any`; their elements were coerced to strings
            match literal.text.as_str() {
                "string" => Some(vec![ident("string")]),
                "list" => Some(collection_type(ident("list"), "string")),
                "map" => Some(collection_type(ident("map"), "string")),
                _ => None,
            }
        }
        _ => None,
    }
}

fn collection_type(keyword: Token, element: &str) -> Vec<Token> {
    vec![
        keyword,
        Token::synthetic(TokenKind::OParen, "("),
        ident(element),
        Token::synthetic(TokenKind::CParen, ")"),
    ]
}

fn ident(name: &str) -> Token {
    Token::synthetic(TokenKind::Ident, name)
}

/// No second interpolation or literal text outside nested quoted templates
fn is_single_interpolation(interior: &[Token]) -> bool {
    let mut quotes: isize = 0;
    for token in interior {
        match token.kind {
            TokenKind::OQuote => quotes += 1,
            TokenKind::CQuote => quotes -= 1,
            _ if quotes > 0 => {}
            TokenKind::TemplateInterp | TokenKind::TemplateSeqEnd | TokenKind::QuotedLit => {
                return false;
            }
            _ => {}
        }
    }
    true
}

fn trim_newlines(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|t| t.kind != TokenKind::Newline)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| t.kind != TokenKind::Newline)
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}

/// The first `(` is closed by the last `)`
fn is_parenthesized(tokens: &[Token]) -> bool {
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return false;
    };
    if first.kind != TokenKind::OParen || last.kind != TokenKind::CParen {
        return false;
    }

    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OParen => depth += 1,
            TokenKind::CParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{lex, tokens_to_string};

    /// Expression tokens of `x = <expr>`
    fn expr(source: &str) -> Vec<Token> {
        let tokens = lex(&format!("x = {}\n", source)).unwrap();
        let mut expr = tokens[2..tokens.len() - 2].to_vec();
        expr[0].spaces_before = 0;
        expr
    }

    fn render(tokens: &[Token]) -> String {
        tokens_to_string(tokens)
    }

    #[test]
    fn test_unwrap_simple_reference() {
        assert_eq!(render(&unwrap_interpolation(expr("\"${var.foo}\""))), "var.foo");
    }

    #[test]
    fn test_unwrap_strip_markers() {
        assert_eq!(render(&unwrap_interpolation(expr("\"${~var.foo~}\""))), "var.foo");
        assert_eq!(
            render(&unwrap_interpolation(expr("\"${~ var.foo ~}\""))).trim_start(),
            "var.foo"
        );
    }

    #[test]
    fn test_unwrap_keeps_multiple_interpolations() {
        let input = expr("\"${var.foo}-${var.bar}\"");
        assert_eq!(unwrap_interpolation(input.clone()), input);
    }

    #[test]
    fn test_unwrap_keeps_adjacent_interpolations() {
        let input = expr("\"${var.foo}${var.bar}\"");
        assert_eq!(unwrap_interpolation(input.clone()), input);
    }

    #[test]
    fn test_unwrap_keeps_literal_text() {
        let input = expr("\"prefix-${var.foo}\"");
        assert_eq!(unwrap_interpolation(input.clone()), input);
    }

    #[test]
    fn test_unwrap_keeps_plain_strings() {
        let input = expr("\"hello\"");
        assert_eq!(unwrap_interpolation(input.clone()), input);
    }

    #[test]
    fn test_unwrap_with_nested_template() {
        assert_eq!(
            render(&unwrap_interpolation(expr("\"${lookup(var.m, \"${var.k}-x\")}\""))),
            "lookup(var.m, \"${var.k}-x\")"
        );
    }

    #[test]
    fn test_unwrap_trims_newlines() {
        let tokens = unwrap_interpolation(expr("\"${\nvar.foo\n}\""));
        assert_eq!(render(&tokens), "var.foo");
    }

    #[test]
    fn test_unwrap_wraps_multiline_expression() {
        let tokens = unwrap_interpolation(expr("\"${var.a ?\n  1 :\n  2}\""));
        assert_eq!(tokens.first().unwrap().kind, TokenKind::OParen);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::CParen);
        assert_eq!(render(&tokens), "(var.a ?\n  1 :\n  2)");
    }

    #[test]
    fn test_unwrap_does_not_double_wrap() {
        let tokens = unwrap_interpolation(expr("\"${(var.a ?\n 1 : 2)}\""));
        assert_eq!(render(&tokens), "(var.a ?\n 1 : 2)");
    }

    #[test]
    fn test_unwrap_wraps_separately_parenthesized_operands() {
        let tokens = unwrap_interpolation(expr("\"${(var.a) +\n(var.b)}\""));
        assert_eq!(render(&tokens), "((var.a) +\n(var.b))");
    }

    #[test]
    fn test_type_bare_collections() {
        assert_eq!(render(&canonicalize_type(expr("list"))), "list(any)");
        assert_eq!(render(&canonicalize_type(expr("map"))), "map(any)");
        assert_eq!(render(&canonicalize_type(expr("set"))), "set(any)");
    }

    #[test]
    fn test_type_quoted_legacy() {
        assert_eq!(render(&canonicalize_type(expr("\"string\""))), "string");
        assert_eq!(render(&canonicalize_type(expr("\"list\""))), "list(string)");
        assert_eq!(render(&canonicalize_type(expr("\"map\""))), "map(string)");
    }

    #[test]
    fn test_type_leaves_others_alone() {
        for source in ["string", "number", "\"set\"", "list(number)", "object({})"] {
            let input = expr(source);
            assert_eq!(canonicalize_type(input.clone()), input, "{}", source);
        }
    }
}
