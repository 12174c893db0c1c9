//! Format-preserving configuration tree
//!
//! The tree keeps every token it was built from. Comments directly above an
//! attribute or block (no blank line in between) travel with that item, so
//! items can be moved around without losing their documentation.

use std::collections::HashSet;

use super::SyntaxError;
use super::token::{Token, TokenKind};

/// A parsed configuration file
#[derive(Debug, Clone)]
pub struct File {
    pub body: Body,
    /// Tokens after the root body, ending with `Eof`
    pub end: Vec<Token>,
}

impl File {
    pub fn tokens(&self) -> Vec<Token> {
        self.clone().into_tokens()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        let mut out = Vec::new();
        self.body.write_tokens(&mut out);
        out.extend(self.end);
        out
    }
}

/// Attributes, blocks and loose comments enclosed by a block or the file root
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub items: Vec<BodyItem>,
    /// Written on the same line as the enclosing braces, e.g. `a { b = 1 }`
    pub inline: bool,
}

impl Body {
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter().filter_map(|item| match item {
            BodyItem::Attribute(attr) => Some(attr),
            _ => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            BodyItem::Block(block) => Some(block),
            _ => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().find(|attr| attr.name() == name)
    }

    fn write_tokens(self, out: &mut Vec<Token>) {
        for item in self.items {
            item.write_tokens(out);
        }
    }
}

#[derive(Debug, Clone)]
pub enum BodyItem {
    Attribute(Attribute),
    Block(Block),
    /// Comments and blank lines not attached to any item
    Unstructured(Vec<Token>),
}

impl BodyItem {
    /// Make sure the item is terminated by a line break so it can be moved
    pub fn ensure_line_end(&mut self) {
        match self {
            BodyItem::Attribute(attr) => ensure_line_end(&mut attr.trailing),
            BodyItem::Block(block) => ensure_line_end(&mut block.trailing),
            BodyItem::Unstructured(tokens) => {
                if !tokens.is_empty() {
                    ensure_line_end(tokens);
                }
            }
        }
    }

    fn write_tokens(self, out: &mut Vec<Token>) {
        match self {
            BodyItem::Attribute(attr) => attr.write_tokens(out),
            BodyItem::Block(block) => block.write_tokens(out),
            BodyItem::Unstructured(tokens) => out.extend(tokens),
        }
    }
}

/// `name = expression`
#[derive(Debug, Clone)]
pub struct Attribute {
    pub leading_comments: Vec<Token>,
    pub name: Token,
    pub equals: Token,
    pub expr: Vec<Token>,
    /// Inline comments and the line break ending the attribute
    pub trailing: Vec<Token>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name.text
    }

    /// Replace the expression, keeping one space between `=` and its value
    pub fn set_expr(&mut self, mut expr: Vec<Token>) {
        if let Some(first) = expr.first_mut() {
            first.spaces_before = 1;
        }
        self.expr = expr;
    }

    fn write_tokens(self, out: &mut Vec<Token>) {
        out.extend(self.leading_comments);
        out.push(self.name);
        out.push(self.equals);
        out.extend(self.expr);
        out.extend(self.trailing);
    }
}

/// `type "label" ... { body }`
#[derive(Debug, Clone)]
pub struct Block {
    pub leading_comments: Vec<Token>,
    pub type_token: Token,
    /// Label tokens plus any comments written between the type and `{`
    pub header: Vec<Token>,
    labels: Vec<String>,
    pub open_brace: Token,
    /// Tokens between `{` and the first body item
    pub open_trailing: Vec<Token>,
    pub body: Body,
    pub close_brace: Token,
    /// Inline comments and the line break after `}`
    pub trailing: Vec<Token>,
}

impl Block {
    pub fn block_type(&self) -> &str {
        &self.type_token.text
    }

    /// Parsed label values, escapes kept as written
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rewrite the header as quoted labels separated by single spaces
    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.header = labels.iter().flat_map(|label| quoted_label(label)).collect();
        self.labels = labels;
        self.open_brace.spaces_before = 1;
    }

    /// Turn `a { b = 1 }` into a multi-line block
    pub fn expand_inline_body(&mut self) {
        if !self.body.inline || self.body.items.is_empty() {
            return;
        }
        self.body.inline = false;
        self.open_trailing.push(Token::newline());
        for item in &mut self.body.items {
            item.ensure_line_end();
        }
    }

    fn write_tokens(self, out: &mut Vec<Token>) {
        out.extend(self.leading_comments);
        out.push(self.type_token);
        out.extend(self.header);
        out.push(self.open_brace);
        out.extend(self.open_trailing);
        self.body.write_tokens(out);
        out.push(self.close_brace);
        out.extend(self.trailing);
    }
}

fn quoted_label(label: &str) -> Vec<Token> {
    let mut tokens = vec![Token::synthetic(TokenKind::OQuote, "\"").with_spaces_before(1)];
    if !label.is_empty() {
        tokens.push(Token::synthetic(TokenKind::QuotedLit, label));
    }
    tokens.push(Token::synthetic(TokenKind::CQuote, "\""));
    tokens
}

fn ensure_line_end(tokens: &mut Vec<Token>) {
    if !tokens.last().is_some_and(Token::ends_line) {
        tokens.push(Token::newline());
    }
}

/// Tokenize and parse source text
pub fn parse(source: &str) -> Result<File, SyntaxError> {
    parse_tokens(super::lex(source)?)
}

/// Parse an already classified token stream
pub fn parse_tokens(tokens: Vec<Token>) -> Result<File, SyntaxError> {
    TreeParser::new(tokens).parse_file()
}

struct TreeParser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl TreeParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn parse_file(mut self) -> Result<File, SyntaxError> {
        let body = self.parse_body(false)?;
        let end = self.tokens.collect();
        Ok(File { body, end })
    }

    fn parse_body(&mut self, nested: bool) -> Result<Body, SyntaxError> {
        let mut items = Vec::new();
        let mut loose: Vec<Token> = Vec::new();
        let mut names = HashSet::new();

        loop {
            match self.peek_kind() {
                TokenKind::Comment | TokenKind::Newline => loose.push(self.bump()),
                TokenKind::Ident => {
                    let leading = split_leading_comments(&mut loose);
                    if !loose.is_empty() {
                        items.push(BodyItem::Unstructured(std::mem::take(&mut loose)));
                    }
                    let item = self.parse_item(leading)?;
                    if let BodyItem::Attribute(attr) = &item
                        && !names.insert(attr.name().to_string())
                    {
                        return Err(SyntaxError::Parse {
                            line: attr.name.line,
                            column: attr.name.column,
                            message: format!("attribute `{}` is already defined", attr.name()),
                        });
                    }
                    items.push(item);
                }
                TokenKind::CBrace if nested => break,
                TokenKind::Eof if !nested => break,
                TokenKind::Eof => return Err(self.error("unclosed block, expected `}`")),
                _ => return Err(self.error("expected an attribute or block")),
            }
        }

        if !loose.is_empty() {
            items.push(BodyItem::Unstructured(loose));
        }

        Ok(Body {
            items,
            inline: false,
        })
    }

    fn parse_item(&mut self, leading_comments: Vec<Token>) -> Result<BodyItem, SyntaxError> {
        let name = self.bump();
        if self.peek_kind() == TokenKind::Equal {
            self.parse_attribute(leading_comments, name)
                .map(BodyItem::Attribute)
        } else {
            self.parse_block(leading_comments, name).map(BodyItem::Block)
        }
    }

    fn parse_attribute(
        &mut self,
        leading_comments: Vec<Token>,
        name: Token,
    ) -> Result<Attribute, SyntaxError> {
        let equals = self.bump();
        let mut expr = Vec::new();
        let mut depth = 0usize;

        loop {
            let kind = self.peek_kind();
            if depth == 0 {
                match kind {
                    TokenKind::Newline | TokenKind::Eof | TokenKind::CBrace => break,
                    TokenKind::Comment if self.peek_ends_line() => break,
                    _ => {}
                }
            }
            if kind == TokenKind::Eof {
                return Err(self.error("unclosed expression"));
            }
            if kind.opens_nesting() {
                depth += 1;
            } else if kind.closes_nesting() {
                if depth == 0 {
                    return Err(self.error("unexpected closing delimiter"));
                }
                depth -= 1;
            }
            expr.push(self.bump());
        }

        let mut trailing = Vec::new();
        while expr.last().is_some_and(|t| t.kind == TokenKind::Comment) {
            if let Some(comment) = expr.pop() {
                trailing.insert(0, comment);
            }
        }
        if expr.is_empty() {
            return Err(self.error("expected an expression"));
        }
        if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            trailing.push(self.bump());
        }

        Ok(Attribute {
            leading_comments,
            name,
            equals,
            expr,
            trailing,
        })
    }

    fn parse_block(
        &mut self,
        leading_comments: Vec<Token>,
        type_token: Token,
    ) -> Result<Block, SyntaxError> {
        let mut header = Vec::new();
        let mut labels = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::OBrace => break,
                TokenKind::Ident => {
                    let label = self.bump();
                    labels.push(label.text.clone());
                    header.push(label);
                }
                TokenKind::OQuote => {
                    let (value, tokens) = self.parse_quoted_label()?;
                    labels.push(value);
                    header.extend(tokens);
                }
                TokenKind::Comment if !self.peek_ends_line() => header.push(self.bump()),
                _ => return Err(self.error("expected a block label or `{`")),
            }
        }

        let open_brace = self.bump();
        let mut open_trailing = Vec::new();
        while self.peek_kind() == TokenKind::Comment && !self.peek_ends_line() {
            open_trailing.push(self.bump());
        }

        let body = match self.peek_kind() {
            TokenKind::Newline | TokenKind::Comment => {
                open_trailing.push(self.bump());
                self.parse_body(true)?
            }
            TokenKind::CBrace => Body {
                items: Vec::new(),
                inline: true,
            },
            TokenKind::Ident => self.parse_inline_body()?,
            _ => return Err(self.error("expected a line break after `{`")),
        };

        if self.peek_kind() != TokenKind::CBrace {
            return Err(self.error("expected `}`"));
        }
        let close_brace = self.bump();

        let mut trailing = Vec::new();
        while self.peek_kind() == TokenKind::Comment && !self.peek_ends_line() {
            trailing.push(self.bump());
        }
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Comment => trailing.push(self.bump()),
            TokenKind::Eof => {}
            _ => return Err(self.error("expected a line break after `}`")),
        }

        Ok(Block {
            leading_comments,
            type_token,
            header,
            labels,
            open_brace,
            open_trailing,
            body,
            close_brace,
            trailing,
        })
    }

    fn parse_inline_body(&mut self) -> Result<Body, SyntaxError> {
        let name = self.bump();
        if self.peek_kind() != TokenKind::Equal {
            return Err(self.error("a single-line block may only contain one attribute"));
        }
        let attr = self.parse_attribute(Vec::new(), name)?;
        Ok(Body {
            items: vec![BodyItem::Attribute(attr)],
            inline: true,
        })
    }

    fn parse_quoted_label(&mut self) -> Result<(String, Vec<Token>), SyntaxError> {
        let mut tokens = vec![self.bump()];
        let mut value = String::new();

        loop {
            match self.peek_kind() {
                TokenKind::QuotedLit => {
                    let lit = self.bump();
                    value.push_str(&lit.text);
                    tokens.push(lit);
                }
                TokenKind::CQuote => {
                    tokens.push(self.bump());
                    return Ok((value, tokens));
                }
                TokenKind::TemplateInterp | TokenKind::TemplateControl => {
                    return Err(self.error("template sequences are not allowed in block labels"));
                }
                _ => return Err(self.error("unterminated block label")),
            }
        }
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.tokens.peek().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn peek_ends_line(&mut self) -> bool {
        self.tokens.peek().is_some_and(Token::ends_line)
    }

    fn bump(&mut self) -> Token {
        self.tokens
            .next()
            .unwrap_or_else(|| Token::synthetic(TokenKind::Eof, ""))
    }

    fn error(&mut self, message: &str) -> SyntaxError {
        let (line, column) = self.tokens.peek().map_or((0, 0), |t| (t.line, t.column));
        SyntaxError::Parse {
            line,
            column,
            message: message.to_string(),
        }
    }
}

/// Split off the comment lines directly above the next item
fn split_leading_comments(loose: &mut Vec<Token>) -> Vec<Token> {
    let start = loose
        .iter()
        .rposition(|t| t.kind == TokenKind::Newline)
        .map_or(0, |i| i + 1);
    loose.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tokens_to_string;

    #[test]
    fn test_parse_preserves_source() {
        let input = r#"# Header comment

resource "aws_instance" "web" {
  ami           = "ami-123"   # pinned
  count = 2

  tags = {
    Name = "web"
  }

  lifecycle {
    create_before_destroy = true
  }
}

variable "x" { default = 1 }
"#;
        let file = parse(input).unwrap();
        assert_eq!(tokens_to_string(&file.tokens()), input);
    }

    #[test]
    fn test_parse_structure() {
        let input = "resource \"a\" \"b\" {\n  ami = 1\n  nested {\n    x = 2\n  }\n}\n";
        let file = parse(input).unwrap();

        let block = file.body.blocks().next().unwrap();
        assert_eq!(block.block_type(), "resource");
        assert_eq!(block.labels(), ["a".to_string(), "b".to_string()]);
        assert!(block.body.attribute("ami").is_some());

        let nested = block.body.blocks().next().unwrap();
        assert_eq!(nested.block_type(), "nested");
        assert!(nested.labels().is_empty());
        assert_eq!(nested.body.attribute("x").unwrap().expr[0].text, "2");
    }

    #[test]
    fn test_parse_attaches_leading_comments() {
        let input = "# detached\n\n# attached\nx = 1\n";
        let file = parse(input).unwrap();

        match &file.body.items[0] {
            BodyItem::Unstructured(tokens) => {
                assert_eq!(tokens.len(), 2);
                assert_eq!(tokens[0].text, "# detached\n");
            }
            other => panic!("Expected unstructured tokens, got {:?}", other),
        }
        let attr = file.body.attribute("x").unwrap();
        assert_eq!(attr.leading_comments.len(), 1);
        assert_eq!(attr.leading_comments[0].text, "# attached\n");
    }

    #[test]
    fn test_parse_inline_comment_is_trailing() {
        let file = parse("x = 1 # one\n").unwrap();
        let attr = file.body.attribute("x").unwrap();
        assert_eq!(attr.expr.len(), 1);
        assert_eq!(attr.trailing[0].text, "# one\n");
    }

    #[test]
    fn test_parse_multiline_expression() {
        let file = parse("x = [\n  1,\n  2,\n]\ny = 2\n").unwrap();
        let attr = file.body.attribute("x").unwrap();
        assert_eq!(attr.expr.first().unwrap().kind, TokenKind::OBrack);
        assert_eq!(attr.expr.last().unwrap().kind, TokenKind::CBrack);
        assert!(file.body.attribute("y").is_some());
    }

    #[test]
    fn test_parse_bare_labels() {
        let file = parse("variable foo {\n}\n").unwrap();
        let block = file.body.blocks().next().unwrap();
        assert_eq!(block.labels(), ["foo".to_string()]);
    }

    #[test]
    fn test_set_labels_quotes_and_drops_comments() {
        let mut file = parse("resource aws_s3_bucket /* c */ \"b\"{\n}\n").unwrap();
        let BodyItem::Block(block) = &mut file.body.items[0] else {
            panic!("Expected block");
        };
        let labels = block.labels().to_vec();
        block.set_labels(labels);
        assert_eq!(
            tokens_to_string(&file.tokens()),
            "resource \"aws_s3_bucket\" \"b\" {\n}\n"
        );
    }

    #[test]
    fn test_expand_inline_body() {
        let mut file = parse("a { b = 1 }\n").unwrap();
        let BodyItem::Block(block) = &mut file.body.items[0] else {
            panic!("Expected block");
        };
        assert!(block.body.inline);
        block.expand_inline_body();
        assert!(!block.body.inline);
        assert_eq!(tokens_to_string(&file.tokens()), "a {\n b = 1\n }\n");
    }

    #[test]
    fn test_parse_rejects_unclosed_block() {
        let err = parse("a {\n  b = 1\n").unwrap_err();
        assert!(matches!(err, SyntaxError::Parse { .. }));
    }

    #[test]
    fn test_parse_rejects_duplicate_attribute() {
        let err = parse("resource \"a\" \"b\" {\n  ami = 1\n  ami = 2\n}\n").unwrap_err();
        assert!(matches!(
            err,
            SyntaxError::Parse {
                line: 3,
                column: 3,
                ..
            }
        ));

        let err = parse("x = 1\nx = 2\n").unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_parse_allows_same_name_in_different_bodies() {
        assert!(parse("ami = 1\na {\n  ami = 2\n}\nb {\n  ami = 3\n}\n").is_ok());
    }

    #[test]
    fn test_parse_rejects_missing_expression() {
        let err = parse("a =\n").unwrap_err();
        assert_eq!(err.line(), 1);
    }
}
