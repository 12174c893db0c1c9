//! Line layout
//!
//! Final pass over the serialized tokens: indentation, alignment of `=` in
//! consecutive attribute lines, and trailing whitespace. Token text is never
//! changed except for trailing whitespace inside line comments.

use crate::syntax::{Token, TokenKind, write_token};

const INDENT: usize = 2;

struct Line {
    tokens: Vec<Token>,
    /// Nesting level, or `None` when the line is heredoc content
    level: Option<usize>,
}

impl Line {
    /// Width of the attribute name when the line starts with `name =`
    fn attribute_name_width(&self) -> Option<usize> {
        self.level?;
        match self.tokens.as_slice() {
            [name, equals, ..] if name.kind == TokenKind::Ident && equals.kind == TokenKind::Equal => {
                Some(name.text.chars().count())
            }
            _ => None,
        }
    }
}

/// Render tokens as laid-out text
///
/// Line breaks created by earlier passes, and the final one, are written as
/// `newline`; line breaks read from the source keep their own terminator.
pub fn layout(tokens: Vec<Token>, newline: &str) -> String {
    let mut lines = indent_lines(split_lines(tokens));
    align_equals(&mut lines);

    let mut out = String::new();
    for line in &lines {
        for token in &line.tokens {
            if token.kind == TokenKind::Comment && token.ends_line() {
                write_token(&mut out, token, &trim_comment(&token.text));
            } else if token.kind == TokenKind::Newline && token.line == 0 {
                write_token(&mut out, token, newline);
            } else {
                write_token(&mut out, token, &token.text);
            }
        }
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    if !out.is_empty() {
        out.push_str(newline);
    }
    out
}

fn split_lines(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        let ends_line = token.ends_line();
        current.push(token);
        if ends_line {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Assign each line its nesting level and fix up leading and trailing spaces
fn indent_lines(raw: Vec<Vec<Token>>) -> Vec<Line> {
    // Line index on which each open bracket was opened
    let mut open: Vec<usize> = Vec::new();
    let mut heredocs = 0usize;
    let mut lines = Vec::with_capacity(raw.len());

    for (index, mut tokens) in raw.into_iter().enumerate() {
        if heredocs > 0 {
            track_nesting(&tokens, index, &mut open, &mut heredocs);
            lines.push(Line { tokens, level: None });
            continue;
        }

        let leading_closers = tokens
            .iter()
            .take_while(|t| t.kind.closes_nesting())
            .count();
        for _ in 0..leading_closers {
            open.pop();
        }
        let level = distinct_lines(&open);
        track_nesting(&tokens[leading_closers..], index, &mut open, &mut heredocs);

        for token in &mut tokens {
            if matches!(token.kind, TokenKind::Newline | TokenKind::Eof) {
                token.spaces_before = 0;
            }
        }
        if let Some(first) = tokens.first_mut()
            && !matches!(first.kind, TokenKind::Newline | TokenKind::Eof)
        {
            first.spaces_before = level * INDENT;
        }
        lines.push(Line {
            tokens,
            level: Some(level),
        });
    }

    lines
}

fn track_nesting(tokens: &[Token], index: usize, open: &mut Vec<usize>, heredocs: &mut usize) {
    for token in tokens {
        if token.kind.opens_nesting() {
            open.push(index);
        } else if token.kind.closes_nesting() {
            open.pop();
        }
        match token.kind {
            TokenKind::OHeredoc => *heredocs += 1,
            TokenKind::CHeredoc => *heredocs = heredocs.saturating_sub(1),
            _ => {}
        }
    }
}

/// Brackets opened on the same line count as one level
fn distinct_lines(open: &[usize]) -> usize {
    let mut levels = 0;
    let mut last = None;
    for &line in open {
        if last != Some(line) {
            levels += 1;
            last = Some(line);
        }
    }
    levels
}

/// Line up `=` across runs of attribute lines at the same level
fn align_equals(lines: &mut [Line]) {
    let mut start = 0;
    while start < lines.len() {
        let Some(level) = lines[start]
            .attribute_name_width()
            .and(lines[start].level)
        else {
            start += 1;
            continue;
        };

        let mut end = start + 1;
        while end < lines.len()
            && lines[end].level == Some(level)
            && lines[end].attribute_name_width().is_some()
        {
            end += 1;
        }

        let width = lines[start..end]
            .iter()
            .filter_map(Line::attribute_name_width)
            .max()
            .unwrap_or_default();
        for line in &mut lines[start..end] {
            let name_width = line.attribute_name_width().unwrap_or(width);
            line.tokens[1].spaces_before = width - name_width + 1;
            if let Some(value) = line.tokens.get_mut(2)
                && value.kind != TokenKind::Newline
            {
                value.spaces_before = 1;
            }
        }
        start = end;
    }
}

fn trim_comment(text: &str) -> String {
    let (body, ending) = match text.strip_suffix("\r\n") {
        Some(body) => (body, "\r\n"),
        None => (text.strip_suffix('\n').unwrap_or(text), "\n"),
    };
    format!("{}{}", body.trim_end_matches([' ', '\t']), ending)
}
