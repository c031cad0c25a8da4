//! Single-pass lexer: source text to a terminated token stream.
//!
//! The lexer never backtracks and never re-reads a character once it has moved past
//! it. Positions are tracked eagerly so every token (and the final `Eof`) carries the
//! `(line, column)` of its first character, which is what the parser and, later, every
//! diagnostic rendered from a parsed node rely on.

use crate::pos::Position;
use crate::token::{Keyword, Token, TokenKind};
use std::fmt;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

pub type LexResult<T> = Result<T, LexError>;

struct Cursor<'a> {
    chars: Chars<'a>,
    peeked: Option<char>,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let peeked = chars.next();
        Self {
            chars,
            peeked,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.peeked
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.clone().nth(offset.saturating_sub(1))
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let current = self.peeked.take();
        if let Some(c) = current {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.peeked = self.chars.next();
        current
    }
}

/// Scans an entire source file into a token stream terminated by [`TokenKind::Eof`].
pub fn lex(source: &str) -> LexResult<Vec<Token>> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    loop {
        skip_trivia(&mut cursor);
        let position = cursor.position();
        let Some(c) = cursor.peek() else {
            tokens.push(Token::new(TokenKind::Eof, position));
            return Ok(tokens);
        };

        let kind = if c.is_ascii_digit() {
            lex_number(&mut cursor, position, false)?
        } else if c == '-' && !ends_with_value(&tokens) && cursor.peek_at(1).is_some_and(|next| next.is_ascii_digit()) {
            // Only consumed as a signed literal atom when `-` is in prefix position (not
            // immediately after something a subtraction could apply to) and a digit
            // immediately follows; otherwise `-` is its own token and the parser's
            // unary/binary disambiguation handles it, so `3-5` still lexes as
            // `IntLiteral(3) Negate IntLiteral(5)` rather than two adjacent literals.
            cursor.advance();
            lex_number(&mut cursor, position, true)?
        } else if is_ident_start(c) {
            lex_ident_or_keyword(&mut cursor)
        } else if c == '\'' {
            lex_char_literal(&mut cursor, position)?
        } else if c == '"' {
            lex_string_literal(&mut cursor, position)?
        } else {
            lex_symbol(&mut cursor, position)?
        };

        tokens.push(Token::new(kind, position));
    }
}

fn skip_trivia(cursor: &mut Cursor<'_>) {
    loop {
        match cursor.peek() {
            Some(c) if c.is_whitespace() => {
                cursor.advance();
            }
            Some('#') => {
                while let Some(c) = cursor.peek() {
                    if c == '\n' {
                        break;
                    }
                    cursor.advance();
                }
            }
            _ => return,
        }
    }
}

/// True when the most recently emitted token could end an expression atom, meaning a
/// following `-` is a binary/subtraction operator rather than a literal's sign.
fn ends_with_value(tokens: &[Token]) -> bool {
    matches!(
        tokens.last().map(|t| &t.kind),
        Some(TokenKind::IntLiteral(_))
            | Some(TokenKind::BoolLiteral(_))
            | Some(TokenKind::CharLiteral(_))
            | Some(TokenKind::StringLiteral(_))
            | Some(TokenKind::Ident(_))
            | Some(TokenKind::RParen)
            | Some(TokenKind::RBracket)
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex_number(cursor: &mut Cursor<'_>, start: Position, negative: bool) -> LexResult<TokenKind> {
    let mut digits = String::new();
    if negative {
        digits.push('-');
    }
    while let Some(c) = cursor.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    digits.parse::<i32>().map(TokenKind::IntLiteral).map_err(|_| LexError {
        position: start,
        message: format!("integer literal `{digits}` out of range for a 32-bit signed integer"),
    })
}

fn lex_ident_or_keyword(cursor: &mut Cursor<'_>) -> TokenKind {
    let mut word = String::new();
    while let Some(c) = cursor.peek() {
        if is_ident_continue(c) {
            word.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    match word.as_str() {
        "true" => TokenKind::BoolLiteral(true),
        "false" => TokenKind::BoolLiteral(false),
        _ => match Keyword::lookup(&word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(word),
        },
    }
}

fn lex_escape(cursor: &mut Cursor<'_>, position: Position) -> LexResult<char> {
    let Some(c) = cursor.advance() else {
        return Err(LexError {
            position,
            message: "unterminated escape sequence".to_owned(),
        });
    };
    Ok(match c {
        '0' => '\0',
        'b' => '\u{8}',
        't' => '\t',
        'n' => '\n',
        'f' => '\u{c}',
        'r' => '\r',
        '"' => '"',
        '\'' => '\'',
        '\\' => '\\',
        other => {
            return Err(LexError {
                position,
                message: format!("unrecognized escape sequence `\\{other}`"),
            })
        }
    })
}

fn lex_char_literal(cursor: &mut Cursor<'_>, start: Position) -> LexResult<TokenKind> {
    cursor.advance(); // opening quote
    let c = match cursor.peek() {
        Some('\\') => {
            cursor.advance();
            lex_escape(cursor, cursor.position())?
        }
        Some('\'') => {
            return Err(LexError {
                position: start,
                message: "empty character literal".to_owned(),
            })
        }
        Some(c) => {
            cursor.advance();
            c
        }
        None => {
            return Err(LexError {
                position: start,
                message: "unterminated character literal".to_owned(),
            })
        }
    };
    match cursor.peek() {
        Some('\'') => {
            cursor.advance();
            Ok(TokenKind::CharLiteral(c))
        }
        _ => Err(LexError {
            position: start,
            message: "unterminated character literal".to_owned(),
        }),
    }
}

fn lex_string_literal(cursor: &mut Cursor<'_>, start: Position) -> LexResult<TokenKind> {
    cursor.advance(); // opening quote
    let mut value = String::new();
    loop {
        match cursor.peek() {
            Some('"') => {
                cursor.advance();
                return Ok(TokenKind::StringLiteral(value));
            }
            Some('\\') => {
                cursor.advance();
                value.push(lex_escape(cursor, cursor.position())?);
            }
            Some(c) => {
                value.push(c);
                cursor.advance();
            }
            None => {
                return Err(LexError {
                    position: start,
                    message: "unterminated string literal".to_owned(),
                })
            }
        }
    }
}

fn lex_symbol(cursor: &mut Cursor<'_>, start: Position) -> LexResult<TokenKind> {
    let c = cursor.advance().expect("caller checked peek is Some");
    let kind = match c {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semicolon,
        '!' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::NotEqual
            } else {
                TokenKind::Not
            }
        }
        '-' => TokenKind::Negate,
        '*' => TokenKind::Mult,
        '/' => TokenKind::Div,
        '%' => TokenKind::Mod,
        '+' => TokenKind::Add,
        '=' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::Equal
            } else {
                TokenKind::Assign
            }
        }
        '<' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::LessEq
            } else {
                TokenKind::Less
            }
        }
        '>' => {
            if cursor.peek() == Some('=') {
                cursor.advance();
                TokenKind::GreaterEq
            } else {
                TokenKind::Greater
            }
        }
        '&' if cursor.peek() == Some('&') => {
            cursor.advance();
            TokenKind::And
        }
        '|' if cursor.peek() == Some('|') => {
            cursor.advance();
            TokenKind::Or
        }
        other => {
            return Err(LexError {
                position: start,
                message: format!("unexpected character `{other}`"),
            })
        }
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_empty_program() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn lexes_keywords_and_idents() {
        assert_eq!(
            kinds("begin skip end foobar"),
            vec![
                TokenKind::Keyword(Keyword::Begin),
                TokenKind::Keyword(Keyword::Skip),
                TokenKind::Keyword(Keyword::End),
                TokenKind::Ident("foobar".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_comments() {
        assert_eq!(
            kinds("skip # this is ignored\nskip"),
            vec![
                TokenKind::Keyword(Keyword::Skip),
                TokenKind::Keyword(Keyword::Skip),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_and_char_escapes() {
        assert_eq!(
            kinds(r#" "a\nb" '\t' "#),
            vec![
                TokenKind::StringLiteral("a\nb".to_owned()),
                TokenKind::CharLiteral('\t'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_out_of_range_integer() {
        let err = lex("99999999999999").unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn rejects_unrecognized_escape() {
        let err = lex(r#" "\q" "#).unwrap_err();
        assert!(err.message.contains("escape"));
    }

    #[test]
    fn tracks_positions_across_lines() {
        let tokens = lex("skip\nskip").unwrap();
        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[1].position, Position::new(2, 1));
    }

    #[test]
    fn disambiguates_subtraction_from_a_negative_literal() {
        assert_eq!(
            kinds("3-5"),
            vec![TokenKind::IntLiteral(3), TokenKind::Negate, TokenKind::IntLiteral(5), TokenKind::Eof]
        );
        assert_eq!(
            kinds("a-1"),
            vec![
                TokenKind::Ident("a".to_owned()),
                TokenKind::Negate,
                TokenKind::IntLiteral(1),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("a[i-1]"),
            vec![
                TokenKind::Ident("a".to_owned()),
                TokenKind::LBracket,
                TokenKind::Ident("i".to_owned()),
                TokenKind::Negate,
                TokenKind::IntLiteral(1),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("exit -5"), vec![TokenKind::Keyword(Keyword::Exit), TokenKind::IntLiteral(-5), TokenKind::Eof]);
    }

    #[test]
    fn disambiguates_comparison_operators() {
        assert_eq!(
            kinds("< <= > >= == != && ||"),
            vec![
                TokenKind::Less,
                TokenKind::LessEq,
                TokenKind::Greater,
                TokenKind::GreaterEq,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Eof,
            ]
        );
    }
}
