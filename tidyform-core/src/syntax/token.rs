//! Classified tokens
//!
//! Tokens own their text. Whitespace between tokens on a line is not stored as
//! text; it is recorded as a count of blank columns on the following token so
//! that later passes can rewrite spacing without touching token text.

/// Token kinds of the native configuration syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Number,
    /// Opening `"` of a quoted template
    OQuote,
    /// Closing `"` of a quoted template
    CQuote,
    /// Literal text inside a quoted template, escapes included verbatim
    QuotedLit,
    /// `${` or `${~`
    TemplateInterp,
    /// `%{` or `%{~`
    TemplateControl,
    /// `}` or `~}` closing a template sequence
    TemplateSeqEnd,
    /// `<<EOF` or `<<-EOF` including the line break that follows it
    OHeredoc,
    /// Closing heredoc marker including its indentation
    CHeredoc,
    /// Literal text inside a heredoc
    StringLit,
    /// Line comment (terminating line break included) or block comment
    Comment,
    Newline,
    OBrace,
    CBrace,
    OBrack,
    CBrack,
    OParen,
    CParen,
    Equal,
    Comma,
    Colon,
    Question,
    Dot,
    Ellipsis,
    FatArrow,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqualOp,
    NotEqual,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    And,
    Or,
    Eof,
}

impl TokenKind {
    /// Opens a nesting level that a line break cannot terminate
    pub fn opens_nesting(self) -> bool {
        matches!(
            self,
            TokenKind::OBrace
                | TokenKind::OBrack
                | TokenKind::OParen
                | TokenKind::TemplateInterp
                | TokenKind::TemplateControl
                | TokenKind::OHeredoc
        )
    }

    /// Closes a nesting level opened by a token for which `opens_nesting` holds
    pub fn closes_nesting(self) -> bool {
        matches!(
            self,
            TokenKind::CBrace
                | TokenKind::CBrack
                | TokenKind::CParen
                | TokenKind::TemplateSeqEnd
                | TokenKind::CHeredoc
        )
    }
}

/// A token with its text and source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line, 0 for synthesized tokens
    pub line: usize,
    /// 1-based column, 0 for synthesized tokens
    pub column: usize,
    /// Blank columns between the previous token on the same line and this one
    pub spaces_before: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            spaces_before: 0,
        }
    }

    /// A token created by a rewrite rather than read from source
    pub fn synthetic(kind: TokenKind, text: impl Into<String>) -> Self {
        Self::new(kind, text, 0, 0)
    }

    pub fn newline() -> Self {
        Self::synthetic(TokenKind::Newline, "\n")
    }

    pub fn with_spaces_before(mut self, spaces: usize) -> Self {
        self.spaces_before = spaces;
        self
    }

    /// Whether the token's text terminates the current line
    pub fn ends_line(&self) -> bool {
        self.text.ends_with('\n')
    }
}

/// Render tokens back to text
pub fn tokens_to_string(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());
    for token in tokens {
        write_token(&mut out, token, &token.text);
    }
    out
}

/// Append a token to `out`, substituting `text` for the token's own text
pub(crate) fn write_token(out: &mut String, token: &Token, text: &str) {
    for _ in 0..token.spaces_before {
        out.push(' ');
    }
    out.push_str(text);
}
