//! Type syntax: base types, pair types, and `[]` array suffixes.

use super::{Parser, ParseResult};
use crate::ast::Type;
use crate::token::{Keyword, TokenKind};

/// Parses a full type: a base type or pair type, followed by zero or more `[]`
/// suffixes.
pub(super) fn parse_type(p: &mut Parser) -> ParseResult<Type> {
    let mut ty = parse_base_or_pair(p)?;
    while p.at(&TokenKind::LBracket) {
        p.advance();
        p.eat(&TokenKind::RBracket)?;
        ty = Type::Array(Box::new(ty));
    }
    Ok(ty)
}

fn parse_base_or_pair(p: &mut Parser) -> ParseResult<Type> {
    if p.at_keyword(Keyword::Pair) {
        p.advance();
        p.eat(&TokenKind::LParen)?;
        let fst = parse_pair_elem_type(p)?;
        p.eat(&TokenKind::Comma)?;
        let snd = parse_pair_elem_type(p)?;
        p.eat(&TokenKind::RParen)?;
        return Ok(Type::Pair(Box::new(fst), Box::new(snd)));
    }
    parse_base(p)
}

fn parse_base(p: &mut Parser) -> ParseResult<Type> {
    let ty = match &p.peek().kind {
        TokenKind::Keyword(Keyword::Int) => Type::Int,
        TokenKind::Keyword(Keyword::Bool) => Type::Bool,
        TokenKind::Keyword(Keyword::Char) => Type::Char,
        TokenKind::Keyword(Keyword::StringType) => Type::String,
        _ => return Err(p.unexpected("a type")),
    };
    p.advance();
    Ok(ty)
}

/// Pair-element types admit a bare `pair` (erased to [`Type::InnerPair`]), a base
/// type, or an array type, but never a nested concrete `pair(...)`.
fn parse_pair_elem_type(p: &mut Parser) -> ParseResult<Type> {
    if p.at_keyword(Keyword::Pair) {
        p.advance();
        return Ok(apply_array_suffixes(p, Type::InnerPair));
    }
    let base = parse_base(p)?;
    Ok(apply_array_suffixes(p, base))
}

fn apply_array_suffixes(p: &mut Parser, mut ty: Type) -> Type {
    while p.at(&TokenKind::LBracket) {
        p.advance();
        if p.eat(&TokenKind::RBracket).is_err() {
            break;
        }
        ty = Type::Array(Box::new(ty));
    }
    ty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::Parser;

    fn ty(src: &str) -> Type {
        let mut p = Parser::new(lex(src).unwrap());
        parse_type(&mut p).unwrap()
    }

    #[test]
    fn parses_base_types() {
        assert_eq!(ty("int"), Type::Int);
        assert_eq!(ty("bool"), Type::Bool);
    }

    #[test]
    fn parses_array_suffixes() {
        assert_eq!(ty("int[]"), Type::Array(Box::new(Type::Int)));
        assert_eq!(ty("int[][]"), Type::Array(Box::new(Type::Array(Box::new(Type::Int)))));
    }

    #[test]
    fn parses_pair_type_with_inner_pair() {
        assert_eq!(
            ty("pair(pair, int)"),
            Type::Pair(Box::new(Type::InnerPair), Box::new(Type::Int))
        );
    }
}
