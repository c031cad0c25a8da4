//! Hand-written recursive-descent parser built from a small set of composable
//! primitives: [`Parser::attempt`] for bounded-lookahead backtracking, [`Parser::expect`]
//! for mandatory-token consumption, and [`Parser::located`] for position attachment.
//!
//! No individual grammar rule threads positions by hand; `located` snapshots the
//! cursor's position before running a sub-parser and applies it to the result.

mod expr;
mod stmt;
mod types;

use crate::ast::{Func, Param, Program, Stat};
use crate::pos::Position;
use crate::token::{Keyword, Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    fn position(&self) -> Position {
        self.peek().position
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.cursor].clone();
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            position: self.position(),
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(format!("expected {expected}, found {}", self.peek().kind))
    }

    /// Consumes the current token if it matches `kind` exactly, else fails without
    /// consuming input.
    fn eat(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> ParseResult<Token> {
        self.eat(&TokenKind::Keyword(kw))
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.at(&TokenKind::Keyword(kw))
    }

    /// Snapshots the cursor, runs `f`, and rewinds on failure without reporting an
    /// error. The parser's only backtracking primitive; every other combinator
    /// consumes input unconditionally on failure.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> Option<T> {
        let saved = self.cursor;
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.cursor = saved;
                None
            }
        }
    }

    /// Snapshots the current token's position, runs `f`, and pairs the position with
    /// the result. Every AST constructor that records a position goes through this.
    fn located<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<(Position, T)> {
        let position = self.position();
        let value = f(self)?;
        Ok((position, value))
    }

    fn sep_by<T>(
        &mut self,
        sep: &TokenKind,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.at(sep) {
            self.advance();
            items.push(item(self)?);
        }
        Ok(items)
    }
}

/// Parses a full token stream (as produced by [`crate::lexer::lex`]) into a [`Program`].
pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
    let mut parser = Parser::new(tokens);
    let program = parse_program(&mut parser)?;
    parser.eat(&TokenKind::Eof)?;
    Ok(program)
}

fn parse_program(p: &mut Parser) -> ParseResult<Program> {
    p.eat_keyword(Keyword::Begin)?;

    let mut funcs = Vec::new();
    loop {
        match p.attempt(parse_func) {
            Some(func) => funcs.push(func),
            None => break,
        }
    }

    let body = stmt::parse_stat_list(p)?;
    p.eat_keyword(Keyword::End)?;
    Ok(Program { funcs, body })
}

/// A function definition is disambiguated from the program's trailing statement list
/// purely by backtracking: both start with a type-shaped token, so we attempt the
/// full `<type> <ident> '(' ... ') is ... end'` shape and rewind if the `(` never
/// shows up (meaning we actually parsed the start of a `Declare` statement).
fn parse_func(p: &mut Parser) -> ParseResult<Func> {
    let position = p.position();
    let return_type = types::parse_type(p)?;
    let name = parse_ident(p)?;
    p.eat(&TokenKind::LParen)?;

    let params = if p.at(&TokenKind::RParen) {
        Vec::new()
    } else {
        p.sep_by(&TokenKind::Comma, parse_param)?
    };
    p.eat(&TokenKind::RParen)?;
    p.eat_keyword(Keyword::Is)?;
    let body = stmt::parse_stat_list(p)?;
    if !ends_in_terminator(&body) {
        return Err(p.error("every function body must end in `return` or `exit`"));
    }
    p.eat_keyword(Keyword::End)?;

    Ok(Func {
        position,
        return_type,
        name,
        params,
        body,
    })
}

fn ends_in_terminator(body: &[Stat]) -> bool {
    match body.last() {
        Some(Stat::Return { .. } | Stat::Exit { .. }) => true,
        Some(Stat::If {
            then_body,
            else_body,
            ..
        }) => ends_in_terminator(then_body) && ends_in_terminator(else_body),
        Some(Stat::Scope { body }) => ends_in_terminator(body),
        _ => false,
    }
}

fn parse_param(p: &mut Parser) -> ParseResult<Param> {
    let position = p.position();
    let ty = types::parse_type(p)?;
    let name = parse_ident(p)?;
    Ok(Param { position, ty, name })
}

pub(crate) fn parse_ident(p: &mut Parser) -> ParseResult<String> {
    match p.peek().kind.clone() {
        TokenKind::Ident(name) => {
            p.advance();
            Ok(name)
        }
        _ => Err(p.unexpected("identifier")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> ParseResult<Program> {
        parse(lex(src).unwrap())
    }

    #[test]
    fn parses_skip_program() {
        let program = parse_src("begin skip end").unwrap();
        assert!(program.funcs.is_empty());
        assert_eq!(program.body, vec![Stat::Skip]);
    }

    #[test]
    fn parses_declare_and_exit() {
        let program = parse_src("begin int x = 3 ; exit x end").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn parses_function_then_body() {
        let program = parse_src("begin int f(int x) is return x end ; exit call f(1) end").unwrap();
        assert_eq!(program.funcs.len(), 1);
        assert_eq!(program.funcs[0].name, "f");
        assert_eq!(program.funcs[0].params.len(), 1);
    }

    #[test]
    fn rejects_function_without_terminator() {
        let err = parse_src("begin int f() is skip end ; exit 0 end").unwrap_err();
        assert!(err.message.contains("return"));
    }

    #[test]
    fn rejects_trailing_semicolon() {
        assert!(parse_src("begin skip ; end").is_err());
    }
}
