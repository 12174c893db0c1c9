//! Pest-based token classifier

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::SyntaxError;
use super::token::{Token, TokenKind};

#[derive(Parser)]
#[grammar = "syntax/hcl.pest"]
struct HclLexer;

impl From<pest::error::Error<Rule>> for SyntaxError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        SyntaxError::Lex {
            line,
            column,
            message: err.variant.message().to_string(),
        }
    }
}

/// Split source text into classified tokens, ending with an `Eof` token
pub fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let pairs = HclLexer::parse(Rule::file, source)?;

    let mut tokens = Vec::new();
    let mut prev_end = 0;

    for pair in pairs.flat_map(|file| file.into_inner()) {
        let span = pair.as_span();
        let (line, column) = span.start_pos().line_col();
        let spaces_before = source[prev_end..span.start()].chars().count();
        prev_end = span.end();

        let kind = classify(&pair);
        tokens.push(Token::new(kind, span.as_str(), line, column).with_spaces_before(spaces_before));
    }

    Ok(tokens)
}

fn classify(pair: &Pair<'_, Rule>) -> TokenKind {
    match pair.as_rule() {
        Rule::comment => TokenKind::Comment,
        Rule::newline => TokenKind::Newline,
        Rule::ident => TokenKind::Ident,
        Rule::number => TokenKind::Number,

        Rule::o_quote => TokenKind::OQuote,
        Rule::c_quote => TokenKind::CQuote,
        Rule::quoted_lit => TokenKind::QuotedLit,
        Rule::t_interp => TokenKind::TemplateInterp,
        Rule::t_control => TokenKind::TemplateControl,
        Rule::t_seq_end => TokenKind::TemplateSeqEnd,

        Rule::o_heredoc => TokenKind::OHeredoc,
        Rule::c_heredoc => TokenKind::CHeredoc,
        Rule::heredoc_lit | Rule::heredoc_eol => TokenKind::StringLit,

        Rule::o_brace => TokenKind::OBrace,
        Rule::c_brace => TokenKind::CBrace,
        Rule::o_brack => TokenKind::OBrack,
        Rule::c_brack => TokenKind::CBrack,
        Rule::o_paren => TokenKind::OParen,
        Rule::c_paren => TokenKind::CParen,

        Rule::ellipsis => TokenKind::Ellipsis,
        Rule::fat_arrow => TokenKind::FatArrow,
        Rule::equal_op => TokenKind::EqualOp,
        Rule::not_equal => TokenKind::NotEqual,
        Rule::less_than_eq => TokenKind::LessThanEq,
        Rule::greater_than_eq => TokenKind::GreaterThanEq,
        Rule::and => TokenKind::And,
        Rule::or => TokenKind::Or,
        Rule::equal => TokenKind::Equal,
        Rule::bang => TokenKind::Bang,
        Rule::less_than => TokenKind::LessThan,
        Rule::greater_than => TokenKind::GreaterThan,
        Rule::plus => TokenKind::Plus,
        Rule::minus => TokenKind::Minus,
        Rule::star => TokenKind::Star,
        Rule::slash => TokenKind::Slash,
        Rule::percent => TokenKind::Percent,
        Rule::question => TokenKind::Question,
        Rule::colon => TokenKind::Colon,
        Rule::comma => TokenKind::Comma,
        Rule::dot => TokenKind::Dot,

        // Only EOI is left once the silent rules are flattened away
        _ => TokenKind::Eof,
    }
}
