//! Token-level normalization
//!
//! Runs before the tree is built: comment markers, blank lines and comments
//! that would otherwise float free of the item below them.

use std::borrow::Cow;

use crate::syntax::{Token, TokenKind, write_token};

/// Rewrite a raw token stream into normalized source text
pub fn normalize(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());
    let mut resume = 0;
    let mut break_after = None;

    for (i, token) in tokens.iter().enumerate() {
        if i < resume {
            continue;
        }

        // Runs of blank lines collapse to one
        if i > 0 && is_blank_line(tokens, i) && is_blank_line(tokens, i - 1) {
            continue;
        }

        write_token(&mut out, token, &comment_text(token));

        if break_after == Some(i) {
            out.push_str(line_terminator(&token.text));
            break_after = None;
        }

        if token.kind == TokenKind::CBrace && token.column == 1 {
            break_after = missing_separator(tokens, i);
        }

        // Comments indented under a line break start a run that is glued to
        // whatever follows it; blank lines inside the run become `#` lines.
        if token.kind == TokenKind::Comment
            && token.column > 1
            && i > 0
            && tokens[i - 1].kind == TokenKind::Newline
        {
            let mut next = i + 1;
            while let Some(run_token) = tokens.get(next) {
                match run_token.kind {
                    // Line break closing a block comment's line
                    TokenKind::Newline if !tokens[next - 1].ends_line() => {
                        out.push_str(&run_token.text);
                    }
                    TokenKind::Newline => {
                        out.push('#');
                        out.push_str(&run_token.text);
                    }
                    TokenKind::Comment => write_token(&mut out, run_token, &comment_text(run_token)),
                    _ => break,
                }
                next += 1;
            }
            resume = next;
        }
    }

    out
}

/// A newline with nothing but whitespace before it on its line
fn is_blank_line(tokens: &[Token], i: usize) -> bool {
    tokens[i].kind == TokenKind::Newline && (i == 0 || tokens[i - 1].ends_line())
}

/// Index of the token ending the line of the `}` at `close`, when the line
/// after it is neither blank nor the end of the file
fn missing_separator(tokens: &[Token], close: usize) -> Option<usize> {
    let line_end = close + 1;
    if !tokens.get(line_end)?.ends_line() {
        return None;
    }
    let next = tokens.get(line_end + 1)?;
    if next.kind == TokenKind::Eof || is_blank_line(tokens, line_end + 1) {
        return None;
    }
    Some(line_end)
}

fn line_terminator(text: &str) -> &'static str {
    if text.ends_with("\r\n") { "\r\n" } else { "\n" }
}

fn comment_text(token: &Token) -> Cow<'_, str> {
    if token.kind == TokenKind::Comment {
        rewrite_comment_marker(&token.text)
    } else {
        Cow::Borrowed(&token.text)
    }
}

/// `// text` becomes `# text`
fn rewrite_comment_marker(text: &str) -> Cow<'_, str> {
    let Some(rest) = text.strip_prefix("//") else {
        return Cow::Borrowed(text);
    };
    let rest = rest.trim_start_matches([' ', '\t']);
    if rest.is_empty() || rest.starts_with(['\n', '\r']) {
        Cow::Owned(format!("#{}", rest))
    } else {
        Cow::Owned(format!("# {}", rest))
    }
}
