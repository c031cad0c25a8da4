//! Statement, left-value, and right-value parsing.

use super::{expr::parse_expr, parse_ident, types, Parser, ParseResult};
use crate::ast::{LValue, RValue, Stat};
use crate::token::{Keyword, TokenKind};

/// Statements are `;`-separated within a block and do not admit a trailing `;`:
/// `sep_by` only ever consumes a `;` when another statement follows it.
pub(super) fn parse_stat_list(p: &mut Parser) -> ParseResult<Vec<Stat>> {
    p.sep_by(&TokenKind::Semicolon, parse_stat)
}

fn parse_stat(p: &mut Parser) -> ParseResult<Stat> {
    let position = p.position();
    match p.peek().kind.clone() {
        TokenKind::Keyword(Keyword::Skip) => {
            p.advance();
            Ok(Stat::Skip)
        }
        TokenKind::Keyword(Keyword::Read) => {
            p.advance();
            let target = parse_lvalue(p)?;
            Ok(Stat::Read { position, target })
        }
        TokenKind::Keyword(Keyword::Free) => {
            p.advance();
            let value = parse_expr(p)?;
            Ok(Stat::Free { position, value })
        }
        TokenKind::Keyword(Keyword::Return) => {
            p.advance();
            let value = parse_expr(p)?;
            Ok(Stat::Return { position, value })
        }
        TokenKind::Keyword(Keyword::Exit) => {
            p.advance();
            let value = parse_expr(p)?;
            Ok(Stat::Exit { position, value })
        }
        TokenKind::Keyword(Keyword::Print) => {
            p.advance();
            let value = parse_expr(p)?;
            Ok(Stat::Print { position, value })
        }
        TokenKind::Keyword(Keyword::Println) => {
            p.advance();
            let value = parse_expr(p)?;
            Ok(Stat::Println { position, value })
        }
        TokenKind::Keyword(Keyword::If) => parse_if(p, position),
        TokenKind::Keyword(Keyword::While) => parse_while(p, position),
        TokenKind::Keyword(Keyword::Begin) => {
            p.advance();
            let body = parse_stat_list(p)?;
            p.eat_keyword(Keyword::End)?;
            Ok(Stat::Scope { body })
        }
        _ => parse_declare_or_assign(p, position),
    }
}

fn parse_if(p: &mut Parser, position: crate::pos::Position) -> ParseResult<Stat> {
    p.advance();
    let cond = parse_expr(p)?;
    p.eat_keyword(Keyword::Then)?;
    let then_body = parse_stat_list(p)?;
    p.eat_keyword(Keyword::Else)?;
    let else_body = parse_stat_list(p)?;
    p.eat_keyword(Keyword::Fi)?;
    Ok(Stat::If {
        position,
        cond,
        then_body,
        else_body,
    })
}

fn parse_while(p: &mut Parser, position: crate::pos::Position) -> ParseResult<Stat> {
    p.advance();
    let cond = parse_expr(p)?;
    p.eat_keyword(Keyword::Do)?;
    let body = parse_stat_list(p)?;
    p.eat_keyword(Keyword::Done)?;
    Ok(Stat::While { position, cond, body })
}

/// A leading type-shaped token here can only mean `Declare`, since the surrounding
/// `parse_func` backtrack already consumed the `<type> <ident> '('` shape at the
/// statement-list level where that ambiguity exists.
fn parse_declare_or_assign(p: &mut Parser, position: crate::pos::Position) -> ParseResult<Stat> {
    if is_type_start(p) {
        let ty = types::parse_type(p)?;
        let name = parse_ident(p)?;
        p.eat(&TokenKind::Assign)?;
        let value = parse_rvalue(p)?;
        return Ok(Stat::Declare {
            position,
            ty,
            name,
            value,
        });
    }

    let target = parse_lvalue(p)?;
    p.eat(&TokenKind::Assign)?;
    let value = parse_rvalue(p)?;
    Ok(Stat::Assign {
        position,
        target,
        value,
    })
}

fn is_type_start(p: &Parser) -> bool {
    matches!(
        p.peek().kind,
        TokenKind::Keyword(
            Keyword::Int | Keyword::Bool | Keyword::Char | Keyword::StringType | Keyword::Pair
        )
    )
}

fn parse_lvalue(p: &mut Parser) -> ParseResult<LValue> {
    let position = p.position();
    match p.peek().kind.clone() {
        TokenKind::Keyword(Keyword::Fst) | TokenKind::Keyword(Keyword::Snd) => {
            let fst = matches!(p.peek().kind, TokenKind::Keyword(Keyword::Fst));
            p.advance();
            let inner = parse_lvalue(p)?;
            Ok(LValue::PairElem {
                position,
                fst,
                value: Box::new(inner),
            })
        }
        TokenKind::Ident(_) => {
            let name = parse_ident(p)?;
            if !p.at(&TokenKind::LBracket) {
                return Ok(LValue::Ident { position, name });
            }
            let mut indices = Vec::new();
            while p.at(&TokenKind::LBracket) {
                p.advance();
                indices.push(parse_expr(p)?);
                p.eat(&TokenKind::RBracket)?;
            }
            Ok(LValue::ArrayElem {
                position,
                name,
                indices,
            })
        }
        _ => Err(p.unexpected("an assignable target")),
    }
}

fn parse_rvalue(p: &mut Parser) -> ParseResult<RValue> {
    let position = p.position();
    match p.peek().kind.clone() {
        TokenKind::LBracket => {
            p.advance();
            let elems = if p.at(&TokenKind::RBracket) {
                Vec::new()
            } else {
                p.sep_by(&TokenKind::Comma, parse_expr)?
            };
            p.eat(&TokenKind::RBracket)?;
            Ok(RValue::ArrayLit { position, elems })
        }
        TokenKind::Keyword(Keyword::NewPair) => {
            p.advance();
            p.eat(&TokenKind::LParen)?;
            let fst = parse_expr(p)?;
            p.eat(&TokenKind::Comma)?;
            let snd = parse_expr(p)?;
            p.eat(&TokenKind::RParen)?;
            Ok(RValue::NewPair { position, fst, snd })
        }
        TokenKind::Keyword(Keyword::Call) => {
            p.advance();
            let name = parse_ident(p)?;
            p.eat(&TokenKind::LParen)?;
            let args = if p.at(&TokenKind::RParen) {
                Vec::new()
            } else {
                p.sep_by(&TokenKind::Comma, parse_expr)?
            };
            p.eat(&TokenKind::RParen)?;
            Ok(RValue::Call { position, name, args })
        }
        TokenKind::Keyword(Keyword::Fst) | TokenKind::Keyword(Keyword::Snd) => {
            let fst = matches!(p.peek().kind, TokenKind::Keyword(Keyword::Fst));
            p.advance();
            let inner = parse_lvalue(p)?;
            Ok(RValue::PairElem {
                position,
                fst,
                value: Box::new(inner),
            })
        }
        _ => Ok(RValue::Expr(parse_expr(p)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::Parser;

    fn stats(src: &str) -> Vec<Stat> {
        let mut p = Parser::new(lex(src).unwrap());
        parse_stat_list(&mut p).unwrap()
    }

    #[test]
    fn parses_if_else() {
        let body = stats("if true then skip else skip fi");
        assert!(matches!(body[0], Stat::If { .. }));
    }

    #[test]
    fn parses_while() {
        let body = stats("while true do skip done");
        assert!(matches!(body[0], Stat::While { .. }));
    }

    #[test]
    fn parses_array_literal_declare() {
        let body = stats("int[] a = []");
        match &body[0] {
            Stat::Declare { value, .. } => assert!(matches!(value, RValue::ArrayLit { elems, .. } if elems.is_empty())),
            _ => panic!("expected declare"),
        }
    }

    #[test]
    fn parses_pair_elem_lvalue_and_rvalue() {
        let body = stats("fst p = snd q");
        match &body[0] {
            Stat::Assign { target, value, .. } => {
                assert!(matches!(target, LValue::PairElem { fst: true, .. }));
                assert!(matches!(value, RValue::PairElem { fst: false, .. }));
            }
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn parses_call() {
        let body = stats("int x = call f(1, 2)");
        match &body[0] {
            Stat::Declare { value, .. } => {
                assert!(matches!(value, RValue::Call { args, .. } if args.len() == 2));
            }
            _ => panic!("expected declare"),
        }
    }
}
