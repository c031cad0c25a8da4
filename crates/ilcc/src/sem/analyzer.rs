//! Single-pass semantic analysis: scoped name resolution, type checking via the
//! `≡` relation, and print-table construction.
//!
//! Analysis never short-circuits: every statement and expression is visited exactly
//! once regardless of earlier errors, with `Type::Error` used to suppress cascading
//! diagnostics from an already-reported mismatch.

use super::scope::{FunctionSignature, FunctionTable, ScopeTable};
use super::types_eq::{erase_inner, type_eq};
use crate::ast::{BinOp, Expr, Func, LValue, Program, RValue, Stat, Type, UnOp};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pos::Position;
use ahash::AHashMap;

pub type PrintTable = AHashMap<Position, Type>;

pub struct AnalysisResult {
    pub diagnostics: Diagnostics,
    pub print_table: PrintTable,
}

/// Runs the full analysis pass described by the `≡` relation and statement rules.
#[must_use]
pub fn analyze(program: &Program) -> AnalysisResult {
    let mut diagnostics = Diagnostics::new();
    let mut print_table = PrintTable::default();
    let mut functions = FunctionTable::new();

    for func in &program.funcs {
        let signature = FunctionSignature {
            return_type: func.return_type.clone(),
            param_types: func.params.iter().map(|p| p.ty.clone()).collect(),
        };
        if !functions.declare(&func.name, signature) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::RedefinedFunction {
                    name: func.name.clone(),
                },
                func.position,
            ));
        }
    }

    for func in &program.funcs {
        check_func(func, &functions, &mut diagnostics, &mut print_table);
    }

    let mut scopes = ScopeTable::new();
    check_block(
        &program.body,
        &functions,
        &mut scopes,
        None,
        &mut diagnostics,
        &mut print_table,
    );

    AnalysisResult {
        diagnostics,
        print_table,
    }
}

fn check_func(
    func: &Func,
    functions: &FunctionTable,
    diagnostics: &mut Diagnostics,
    print_table: &mut PrintTable,
) {
    let mut scopes = ScopeTable::new();
    for param in &func.params {
        if scopes.declared_in_current_frame(&param.name) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::RedefinedVariable {
                    name: param.name.clone(),
                },
                param.position,
            ));
        } else {
            scopes.declare(&param.name, param.ty.clone());
        }
    }
    check_block(
        &func.body,
        functions,
        &mut scopes,
        Some(&func.return_type),
        diagnostics,
        print_table,
    );
}

/// Visits a statement list in its own fresh inner frame (callers that should not
/// introduce a frame, like a function's own parameter scope, call this directly
/// without pushing first).
fn check_block(
    body: &[Stat],
    functions: &FunctionTable,
    scopes: &mut ScopeTable,
    enclosing_return: Option<&Type>,
    diagnostics: &mut Diagnostics,
    print_table: &mut PrintTable,
) {
    scopes.push_frame();
    for stat in body {
        check_stat(stat, functions, scopes, enclosing_return, diagnostics, print_table);
    }
    scopes.pop_frame();
}

fn check_stat(
    stat: &Stat,
    functions: &FunctionTable,
    scopes: &mut ScopeTable,
    enclosing_return: Option<&Type>,
    diagnostics: &mut Diagnostics,
    print_table: &mut PrintTable,
) {
    match stat {
        Stat::Skip => {}
        Stat::Declare {
            position,
            ty,
            name,
            value,
        } => {
            if scopes.declared_in_current_frame(name) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::RedefinedVariable { name: name.clone() },
                    *position,
                ));
            }
            let value_ty = check_rvalue(value, functions, scopes, diagnostics, print_table);
            if !type_eq(&value_ty, ty) {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, value.position())
                        .with_got(value_ty)
                        .with_expected([ty.clone()])
                        .with_context(format!("declaring `{name}`")),
                );
            }
            scopes.declare(name, ty.clone());
        }
        Stat::Assign {
            position,
            target,
            value,
        } => {
            let target_ty = check_lvalue(target, functions, scopes, diagnostics);
            let value_ty = check_rvalue(value, functions, scopes, diagnostics, print_table);
            if matches!(target, LValue::PairElem { .. })
                && matches!(value, RValue::PairElem { .. })
                && is_unknown_pair_elem_type(&target_ty)
                && is_unknown_pair_elem_type(&value_ty)
            {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, *position)
                        .with_context("cannot assign between two pair elements whose pair type is unknown on both sides"),
                );
            } else if !type_eq(&target_ty, &value_ty) {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, *position)
                        .with_got(value_ty)
                        .with_expected([target_ty]),
                );
            }
        }
        Stat::Read { position, target } => {
            let ty = check_lvalue(target, functions, scopes, diagnostics);
            if !matches!(ty, Type::Int | Type::Char | Type::Error) {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, *position)
                        .with_got(ty)
                        .with_expected([Type::Int, Type::Char]),
                );
            }
        }
        Stat::Free { position, value } => {
            let ty = check_expr(value, functions, scopes, diagnostics, print_table);
            if !matches!(ty, Type::Array(_) | Type::Pair(..) | Type::InnerPair | Type::Error) {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, *position)
                        .with_got(ty)
                        .with_context("`free` requires an array or pair"),
                );
            }
        }
        Stat::Return { position, value } => {
            let ty = check_expr(value, functions, scopes, diagnostics, print_table);
            match enclosing_return {
                None => diagnostics.push(Diagnostic::new(DiagnosticKind::UnexpectedReturn, *position)),
                Some(expected) if !type_eq(&ty, expected) => diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, *position)
                        .with_got(ty)
                        .with_expected([expected.clone()]),
                ),
                Some(_) => {}
            }
        }
        Stat::Exit { position, value } => {
            let ty = check_expr(value, functions, scopes, diagnostics, print_table);
            if !type_eq(&ty, &Type::Int) {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::TypeMismatch, *position)
                        .with_got(ty)
                        .with_expected([Type::Int]),
                );
            }
        }
        Stat::Print { value, .. } | Stat::Println { value, .. } => {
            let ty = check_expr(value, functions, scopes, diagnostics, print_table);
            print_table.insert(value.position(), ty);
        }
        Stat::If {
            position,
            cond,
            then_body,
            else_body,
        } => {
            let cond_ty = check_expr(cond, functions, scopes, diagnostics, print_table);
            require_bool(&cond_ty, *position, diagnostics);
            check_block(then_body, functions, scopes, enclosing_return, diagnostics, print_table);
            check_block(else_body, functions, scopes, enclosing_return, diagnostics, print_table);
        }
        Stat::While { position, cond, body } => {
            let cond_ty = check_expr(cond, functions, scopes, diagnostics, print_table);
            require_bool(&cond_ty, *position, diagnostics);
            check_block(body, functions, scopes, enclosing_return, diagnostics, print_table);
        }
        Stat::Scope { body } => {
            check_block(body, functions, scopes, enclosing_return, diagnostics, print_table);
        }
        Stat::Seq(a, b) => {
            check_stat(a, functions, scopes, enclosing_return, diagnostics, print_table);
            check_stat(b, functions, scopes, enclosing_return, diagnostics, print_table);
        }
    }
}

fn require_bool(ty: &Type, position: Position, diagnostics: &mut Diagnostics) {
    if !type_eq(ty, &Type::Bool) {
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::TypeMismatch, position)
                .with_got(ty.clone())
                .with_expected([Type::Bool]),
        );
    }
}

/// True for the types `check_pair_elem` hands back when it could not resolve a
/// concrete element type for `fst`/`snd` (an unannotated `null`, a prior error, or
/// an as-yet-unconstrained pair element), the only case where a pair-elem-to-pair-elem
/// assignment is genuinely untypeable rather than merely unannotated.
fn is_unknown_pair_elem_type(ty: &Type) -> bool {
    matches!(ty, Type::Any | Type::Null | Type::Error | Type::InnerPair)
}

fn check_lvalue(
    lvalue: &LValue,
    functions: &FunctionTable,
    scopes: &mut ScopeTable,
    diagnostics: &mut Diagnostics,
) -> Type {
    let mut print_table = PrintTable::default();
    check_expr(&lvalue.as_expr(), functions, scopes, diagnostics, &mut print_table)
}

fn check_rvalue(
    rvalue: &RValue,
    functions: &FunctionTable,
    scopes: &mut ScopeTable,
    diagnostics: &mut Diagnostics,
    print_table: &mut PrintTable,
) -> Type {
    match rvalue {
        RValue::Expr(e) => check_expr(e, functions, scopes, diagnostics, print_table),
        RValue::ArrayLit { elems, .. } => {
            if elems.is_empty() {
                return Type::Array(Box::new(Type::Any));
            }
            let mut elem_ty = check_expr(&elems[0], functions, scopes, diagnostics, print_table);
            for elem in &elems[1..] {
                let this_ty = check_expr(elem, functions, scopes, diagnostics, print_table);
                if !type_eq(&elem_ty, &this_ty) {
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::TypeMismatch, elem.position())
                            .with_got(this_ty)
                            .with_expected([elem_ty.clone()])
                            .with_context("array literal elements must share a type"),
                    );
                } else if matches!(elem_ty, Type::Any) {
                    elem_ty = this_ty;
                }
            }
            Type::Array(Box::new(elem_ty))
        }
        RValue::NewPair { fst, snd, .. } => {
            let fst_ty = check_expr(fst, functions, scopes, diagnostics, print_table);
            let snd_ty = check_expr(snd, functions, scopes, diagnostics, print_table);
            Type::Pair(Box::new(erase_inner(&fst_ty)), Box::new(erase_inner(&snd_ty)))
        }
        RValue::Call { position, name, args } => {
            let Some(signature) = functions.get(name) else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UndefinedFunction { name: name.clone() },
                    *position,
                ));
                for arg in args {
                    check_expr(arg, functions, scopes, diagnostics, print_table);
                }
                return Type::Error;
            };
            let expected = signature.param_types.clone();
            let return_type = signature.return_type.clone();
            if args.len() != expected.len() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::IncorrectNumberOfArgs {
                        name: name.clone(),
                        expected: expected.len(),
                        got: args.len(),
                    },
                    *position,
                ));
            }
            for (i, arg) in args.iter().enumerate() {
                let arg_ty = check_expr(arg, functions, scopes, diagnostics, print_table);
                if let Some(param_ty) = expected.get(i) {
                    if !type_eq(&arg_ty, param_ty) {
                        diagnostics.push(
                            Diagnostic::new(DiagnosticKind::TypeMismatch, arg.position())
                                .with_got(arg_ty)
                                .with_expected([param_ty.clone()])
                                .with_context(format!("argument {} of call to `{name}`", i + 1)),
                        );
                    }
                }
            }
            return_type
        }
        RValue::PairElem { position, fst, value } => check_pair_elem(*position, *fst, value, functions, scopes, diagnostics, print_table),
    }
}

fn check_pair_elem(
    position: Position,
    fst: bool,
    lvalue: &LValue,
    functions: &FunctionTable,
    scopes: &mut ScopeTable,
    diagnostics: &mut Diagnostics,
    _print_table: &mut PrintTable,
) -> Type {
    let inner_ty = check_lvalue(lvalue, functions, scopes, diagnostics);
    match inner_ty {
        Type::Pair(a, b) => *(if fst { a } else { b }),
        Type::Null | Type::Any | Type::Error | Type::InnerPair => Type::Any,
        other => {
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::TypeMismatch, position)
                    .with_got(other)
                    .with_context("`fst`/`snd` requires a pair"),
            );
            Type::Error
        }
    }
}

fn check_expr(
    expr: &Expr,
    functions: &FunctionTable,
    scopes: &mut ScopeTable,
    diagnostics: &mut Diagnostics,
    print_table: &mut PrintTable,
) -> Type {
    match expr {
        Expr::IntLiteral { .. } => Type::Int,
        Expr::BoolLiteral { .. } => Type::Bool,
        Expr::CharLiteral { .. } => Type::Char,
        Expr::StringLiteral { .. } => Type::String,
        Expr::Null { .. } => Type::Null,
        Expr::Ident { position, name } => match scopes.lookup(name) {
            Some(ty) => ty.clone(),
            None => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UndefinedVariable { name: name.clone() },
                    *position,
                ));
                Type::Error
            }
        },
        Expr::ArrayElem { position, name, indices } => {
            for idx in indices {
                let idx_ty = check_expr(idx, functions, scopes, diagnostics, print_table);
                if !type_eq(&idx_ty, &Type::Int) {
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::TypeMismatch, idx.position())
                            .with_got(idx_ty)
                            .with_expected([Type::Int])
                            .with_context("array index"),
                    );
                }
            }
            let Some(base_ty) = scopes.lookup(name).cloned() else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UndefinedVariable { name: name.clone() },
                    *position,
                ));
                return Type::Error;
            };
            let mut current = base_ty;
            for _ in indices {
                match current {
                    Type::Array(elem) => current = *elem,
                    Type::Any | Type::Error => return Type::Any,
                    _ => {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::ArrayDimensionMismatch { name: name.clone() },
                            *position,
                        ));
                        return Type::Error;
                    }
                }
            }
            current
        }
        Expr::PairElem { position, fst, value } => {
            let inner_lvalue = expr_as_lvalue(value);
            check_pair_elem(*position, *fst, &inner_lvalue, functions, scopes, diagnostics, print_table)
        }
        Expr::Unary { position, op, operand } => {
            let operand_ty = check_expr(operand, functions, scopes, diagnostics, print_table);
            check_unary(*op, &operand_ty, *position, diagnostics)
        }
        Expr::Binary { position, op, lhs, rhs } => {
            let lhs_ty = check_expr(lhs, functions, scopes, diagnostics, print_table);
            let rhs_ty = check_expr(rhs, functions, scopes, diagnostics, print_table);
            check_binary(*op, &lhs_ty, &rhs_ty, *position, diagnostics)
        }
    }
}

/// Reconstructs the `LValue` shape underneath an `Expr::PairElem`'s boxed operand so
/// `check_pair_elem` (which is shared with the `RValue` path) can be reused; this
/// only ever sees `Ident`/`ArrayElem`/`PairElem` expressions because that is all the
/// parser ever nests inside a `fst`/`snd`.
fn expr_as_lvalue(expr: &Expr) -> LValue {
    match expr {
        Expr::Ident { position, name } => LValue::Ident {
            position: *position,
            name: name.clone(),
        },
        Expr::ArrayElem { position, name, indices } => LValue::ArrayElem {
            position: *position,
            name: name.clone(),
            indices: indices.clone(),
        },
        Expr::PairElem { position, fst, value } => LValue::PairElem {
            position: *position,
            fst: *fst,
            value: Box::new(expr_as_lvalue(value)),
        },
        other => unreachable!("fst/snd never wraps a non-lvalue expression: {other:?}"),
    }
}

fn check_unary(op: UnOp, operand: &Type, position: Position, diagnostics: &mut Diagnostics) -> Type {
    let (expected, result) = match op {
        UnOp::Not => (Type::Bool, Type::Bool),
        UnOp::Negate => (Type::Int, Type::Int),
        UnOp::Ord => (Type::Char, Type::Int),
        UnOp::Chr => (Type::Int, Type::Char),
        UnOp::Len => {
            if matches!(operand, Type::Array(_) | Type::Any | Type::Error) {
                return Type::Int;
            }
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::TypeMismatch, position)
                    .with_got(operand.clone())
                    .with_context("`len` requires an array"),
            );
            return Type::Error;
        }
    };
    if type_eq(operand, &expected) {
        result
    } else {
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::TypeMismatch, position)
                .with_got(operand.clone())
                .with_expected([expected]),
        );
        Type::Error
    }
}

fn check_binary(op: BinOp, lhs: &Type, rhs: &Type, position: Position, diagnostics: &mut Diagnostics) -> Type {
    use BinOp::{Add, And, Div, Equal, Greater, GreaterEq, Less, LessEq, Mod, Mult, NotEqual, Or, Sub};

    let mut mismatch = |expected: &[Type]| {
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::TypeMismatch, position)
                .with_got(lhs.clone())
                .with_expected(expected.to_vec())
                .with_context("operand of binary operator"),
        );
        Type::Error
    };

    match op {
        Mult | Div | Mod | Add | Sub => {
            if type_eq(lhs, &Type::Int) && type_eq(rhs, &Type::Int) {
                Type::Int
            } else {
                mismatch(&[Type::Int])
            }
        }
        Less | LessEq | Greater | GreaterEq => {
            let both_int = type_eq(lhs, &Type::Int) && type_eq(rhs, &Type::Int);
            let both_char = type_eq(lhs, &Type::Char) && type_eq(rhs, &Type::Char);
            if both_int || both_char {
                Type::Bool
            } else {
                mismatch(&[Type::Int, Type::Char])
            }
        }
        Equal | NotEqual => {
            if type_eq(lhs, rhs) {
                Type::Bool
            } else {
                mismatch(std::slice::from_ref(rhs))
            }
        }
        And | Or => {
            if type_eq(lhs, &Type::Bool) && type_eq(rhs, &Type::Bool) {
                Type::Bool
            } else {
                mismatch(&[Type::Bool])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn analyze_src(src: &str) -> AnalysisResult {
        let program = parse(lex(src).unwrap()).unwrap();
        analyze(&program)
    }

    #[test]
    fn accepts_well_typed_program() {
        let result = analyze_src("begin int x = 3 ; exit x end");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn reports_declare_mismatch() {
        let result = analyze_src("begin int x = true end");
        assert_eq!(result.diagnostics.records().len(), 1);
        assert!(matches!(
            result.diagnostics.records()[0].kind,
            DiagnosticKind::TypeMismatch
        ));
    }

    #[test]
    fn reports_undefined_variable_after_scope_exit() {
        let result = analyze_src("begin begin int x = 1 end ; exit x end");
        assert_eq!(result.diagnostics.records().len(), 1);
        assert!(matches!(
            result.diagnostics.records()[0].kind,
            DiagnosticKind::UndefinedVariable { .. }
        ));
    }

    #[test]
    fn reports_incorrect_arg_count() {
        let result = analyze_src("begin int f(int x) is return x end ; exit call f(1, 2) end");
        assert!(result
            .diagnostics
            .records()
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::IncorrectNumberOfArgs { .. })));
    }

    #[test]
    fn empty_array_literal_is_any_and_records_print_table() {
        let result = analyze_src("begin print \"hello\" ; println \"hello\" end");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.print_table.len(), 2);
        for ty in result.print_table.values() {
            assert_eq!(*ty, Type::String);
        }
    }

    #[test]
    fn accumulates_multiple_independent_errors() {
        let result = analyze_src("begin int x = true ; bool y = 1 end");
        assert_eq!(result.diagnostics.records().len(), 2);
    }

    #[test]
    fn rejects_unknown_pair_elem_assignment() {
        let result = analyze_src(
            "begin pair(pair, pair) p = null ; pair(pair, pair) q = null ; fst p = snd q end",
        );
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn accepts_pair_elem_assignment_when_both_sides_resolve_concretely() {
        let result = analyze_src(
            "begin pair(int, int) p = null ; pair(int, int) q = null ; fst p = snd q end",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics.records());
    }
}
