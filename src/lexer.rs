//! Lexer: turns GenQuery source text into a flat token stream.
//!
//! Keywords are matched case-insensitively; the canonical spelling is
//! upper-case. Column identifiers are likewise accepted in any case and are
//! normalized to upper-case so they match the entries in
//! [`crate::catalog::column_name_mappings`].
//!
//! Individual lexemes (identifiers, integer literals, quoted strings,
//! operators) are recognized with `nom` combinators, the same way
//! `open_cypher_parser::common` builds its `identifier_core`/
//! `parse_numeric_literal` recognizers. The outer loop that drains the
//! source into a `Vec<Token>` and the `Position` bookkeeping have no
//! counterpart there — the grammar we parse from tokens, not text, needs a
//! materialized stream (see the module doc on [`crate::parser`]).

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while_m_n};
use nom::character::complete::{char, digit1};
use nom::combinator::{map, recognize};
use nom::sequence::pair;
use nom::{IResult, Parser};

use crate::errors::{CompileError, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    Distinct,
    Where,
    And,
    Or,
    Not,
    Like,
    In,
    Between,
    Is,
    Null,
    Order,
    By,
    Asc,
    Desc,
    Offset,
    Fetch,
    First,
    Rows,
    Only,
    Cast,
    As,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "SELECT" => Keyword::Select,
            "DISTINCT" => Keyword::Distinct,
            "WHERE" => Keyword::Where,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "LIKE" => Keyword::Like,
            "IN" => Keyword::In,
            "BETWEEN" => Keyword::Between,
            "IS" => Keyword::Is,
            "NULL" => Keyword::Null,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "OFFSET" => Keyword::Offset,
            "FETCH" => Keyword::Fetch,
            "FIRST" => Keyword::First,
            "ROWS" => Keyword::Rows,
            "ONLY" => Keyword::Only,
            "CAST" => Keyword::Cast,
            "AS" => Keyword::As,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    /// An upper-cased identifier: a column name, or a bare word like an
    /// aggregate function name or cast type that the parser interprets
    /// according to its position in the grammar.
    Identifier(String),
    StringLiteral(String),
    IntegerLiteral(String),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Comma,
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

type LexResult<'a, O> = IResult<&'a str, O>;

// One or more alphanumeric/underscore characters preceded by a single
// alphabetic start character, mirroring `identifier_core`'s
// alphanumeric-then-underscore-runs shape but anchored to an alphabetic head
// so bare digits never lex as identifiers.
fn identifier(input: &str) -> LexResult<&str> {
    recognize(pair(
        take_while_m_n(1, 1, |c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn integer_literal(input: &str) -> LexResult<&str> {
    digit1(input)
}

// Single-quoted string literal with SQL-style doubled-quote escaping
// (`'it''s'` -> `it's`). The teacher's own quoted-literal recognizer
// (`take_until("'")` in `parse_alphanumeric_with_underscore_dot_star`)
// doesn't need escape handling for Cypher string bodies; GenQuery's grammar
// does, so the quote body is peeled off in `''`-delimited chunks instead.
fn string_literal(input: &str) -> LexResult<String> {
    let (mut rest, _) = char('\'').parse(input)?;
    let mut value = String::new();
    loop {
        let (next, chunk) = take_while(|c: char| c != '\'')(rest)?;
        value.push_str(chunk);
        rest = next;
        if let Ok((next, _)) = tag::<_, _, nom::error::Error<&str>>("''").parse(rest) {
            value.push('\'');
            rest = next;
            continue;
        }
        let (next, _) = char('\'').parse(rest)?;
        rest = next;
        break;
    }
    Ok((rest, value))
}

fn operator(input: &str) -> LexResult<TokenKind> {
    alt((
        map(tag("!="), |_| TokenKind::Ne),
        map(tag("<="), |_| TokenKind::Le),
        map(tag(">="), |_| TokenKind::Ge),
        map(char('='), |_| TokenKind::Eq),
        map(char('<'), |_| TokenKind::Lt),
        map(char('>'), |_| TokenKind::Gt),
        map(char(','), |_| TokenKind::Comma),
        map(char('('), |_| TokenKind::LParen),
        map(char(')'), |_| TokenKind::RParen),
    ))
    .parse(input)
}

fn token_kind(input: &str) -> LexResult<TokenKind> {
    alt((
        map(string_literal, TokenKind::StringLiteral),
        map(integer_literal, |s: &str| TokenKind::IntegerLiteral(s.to_string())),
        map(identifier, |word: &str| {
            let upper = word.to_ascii_uppercase();
            match Keyword::from_word(&upper) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(upper),
            }
        }),
        operator,
    ))
    .parse(input)
}

fn position_at(source: &str, rest: &str) -> Position {
    let consumed = &source[..source.len() - rest.len()];
    let offset = consumed.chars().count();
    let line = consumed.matches('\n').count() + 1;
    let column = match consumed.rfind('\n') {
        Some(idx) => consumed[idx + '\n'.len_utf8()..].chars().count() + 1,
        None => offset + 1,
    };
    Position { offset, line, column }
}

/// Lex a complete GenQuery source string into a token stream, terminated by
/// a trailing [`TokenKind::Eof`].
pub fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut rest = source;

    loop {
        let (after_ws, _) =
            take_while::<_, _, nom::error::Error<&str>>(|c: char| c.is_whitespace())(rest)
                .expect("take_while never fails");
        rest = after_ws;
        let position = position_at(source, rest);

        if rest.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                position,
            });
            break;
        }

        match token_kind(rest) {
            Ok((next, kind)) => {
                tokens.push(Token { kind, position });
                rest = next;
            }
            Err(_) => {
                let ch = rest.chars().next().expect("checked non-empty above");
                return Err(CompileError::LexError { ch, position });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_case_insensitively() {
        assert_eq!(
            kinds("select distinct"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::Distinct),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_identifier_uppercased() {
        assert_eq!(
            kinds("data_name"),
            vec![TokenKind::Identifier("DATA_NAME".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_string_literal_with_doubled_quote_escape() {
        assert_eq!(
            kinds("'a''b'"),
            vec![TokenKind::StringLiteral("a'b".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_operators() {
        assert_eq!(
            kinds("= != < <= > >="),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = lex("DATA_NAME @").unwrap_err();
        assert!(matches!(err, CompileError::LexError { ch: '@', .. }));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("'abc").unwrap_err();
        assert!(matches!(err, CompileError::LexError { ch: '\'', .. }));
    }
}
