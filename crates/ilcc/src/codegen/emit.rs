//! AST-to-instruction traversal. Consumes a type-checked `Program` (and the print
//! table built alongside it) and produces the typed instruction stream the assembly
//! printer renders.
//!
//! The generator trusts the AST is well-typed: it performs no validation of its own,
//! and any lookup failure here (an identifier with no recorded stack slot, a function
//! call to an unregistered name) is a compiler bug and panics rather than emitting a
//! silently wrong assembly file.

use super::instr::{Cond, Instr, Operand2, Register};
use super::state::CodegenState;
use crate::ast::{BinOp, Expr, Func, LValue, Param, Program, RValue, Stat, Type, UnOp};
use crate::sem::PrintTable;
use ahash::AHashSet;

/// Runs code generation over a type-checked program, returning the finished
/// instruction stream and the string pool it populated along the way.
#[must_use]
pub fn generate(program: &Program, print_table: &PrintTable) -> (Vec<Instr>, super::strpool::StringPool) {
    let function_names: AHashSet<String> = program.funcs.iter().map(|f| f.name.clone()).collect();
    let mut state = CodegenState::new(function_names);

    for func in &program.funcs {
        emit_func(&mut state, func, print_table);
    }

    state.emit(Instr::Label("main".to_owned()));
    state.emit(Instr::Push(vec![Register::LinkRegister]));
    state.enter_function_frame();
    let frame_size = compute_frame_size(&[], &program.body);
    emit_stack_reserve(&mut state, frame_size);
    emit_block(&mut state, &program.body, print_table, frame_size);
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst: Register::R(0),
        src: Operand2::Imm(0),
    });
    emit_stack_release(&mut state, frame_size);
    state.emit(Instr::Pop(vec![Register::ProgramCounter]));
    state.emit(Instr::Directive(".ltorg".to_owned()));

    (state.instrs, state.strings)
}

fn emit_func(state: &mut CodegenState, func: &Func, print_table: &PrintTable) {
    state.emit(Instr::Label(format!("wacc_{}", func.name)));
    state.emit(Instr::Push(vec![Register::LinkRegister]));
    state.enter_function_frame();
    for param in &func.params {
        state.bind_param(&param.name, &param.ty);
    }
    let frame_size = compute_frame_size(&func.params, &func.body);
    emit_stack_reserve(state, frame_size);
    emit_block(state, &func.body, print_table, frame_size);
    state.emit(Instr::Directive(".ltorg".to_owned()));
}

/// Replays the same bind/scope bookkeeping `emit_block` performs, without emitting
/// any instructions, to learn how much stack space a body needs before the first
/// instruction of that body is emitted. The prologue's `sub sp, sp, #N` has to
/// precede the locals it reserves room for, but `CodegenState::used_stack_size`
/// is only fully known after a complete walk of the body.
fn compute_frame_size(params: &[Param], body: &[Stat]) -> i32 {
    let mut scratch = CodegenState::new(AHashSet::default());
    scratch.enter_function_frame();
    for param in params {
        scratch.bind_param(&param.name, &param.ty);
    }
    size_walk_block(&mut scratch, body);
    scratch.used_stack_size()
}

fn size_walk_block(state: &mut CodegenState, body: &[Stat]) {
    let mark = state.mark_scope();
    for stat in body {
        size_walk_stat(state, stat);
    }
    state.restore_scope(mark);
}

fn size_walk_stat(state: &mut CodegenState, stat: &Stat) {
    match stat {
        Stat::Declare { ty, name, .. } => state.bind_local(name, ty),
        Stat::If { then_body, else_body, .. } => {
            size_walk_block(state, then_body);
            size_walk_block(state, else_body);
        }
        Stat::While { body, .. } => size_walk_block(state, body),
        Stat::Scope { body } => size_walk_block(state, body),
        Stat::Seq(a, b) => {
            size_walk_stat(state, a);
            size_walk_stat(state, b);
        }
        Stat::Skip | Stat::Assign { .. } | Stat::Read { .. } | Stat::Free { .. } | Stat::Return { .. } | Stat::Exit { .. } | Stat::Print { .. } | Stat::Println { .. } => {}
    }
}

/// Reserves `frame_size` bytes below the saved link register so the first local's
/// `sp`-relative slot doesn't land on top of it.
fn emit_stack_reserve(state: &mut CodegenState, frame_size: i32) {
    if frame_size > 0 {
        state.emit(Instr::Sub {
            dst: Register::StackPointer,
            lhs: Register::StackPointer,
            rhs: Operand2::Imm(frame_size),
        });
    }
}

/// Matches `emit_stack_reserve`; must run immediately before every `pop {pc}` so
/// the stack pointer is back at the saved link register when it's popped.
fn emit_stack_release(state: &mut CodegenState, frame_size: i32) {
    if frame_size > 0 {
        state.emit(Instr::Add {
            dst: Register::StackPointer,
            lhs: Register::StackPointer,
            rhs: Operand2::Imm(frame_size),
        });
    }
}

fn emit_block(state: &mut CodegenState, body: &[Stat], print_table: &PrintTable, frame_size: i32) {
    let mark = state.mark_scope();
    for stat in body {
        emit_stat(state, stat, print_table, frame_size);
    }
    state.restore_scope(mark);
}

fn emit_stat(state: &mut CodegenState, stat: &Stat, print_table: &PrintTable, frame_size: i32) {
    match stat {
        Stat::Skip => {}
        Stat::Declare { ty, name, value, .. } => {
            let dst = state.regs.peek();
            emit_rvalue(state, value, dst, print_table);
            state.bind_local(name, ty);
            let offset = stack_relative_offset(state, name);
            state.emit(Instr::Store {
                src: dst,
                addr: Register::StackPointer,
                offset,
            });
        }
        Stat::Assign { target, value, .. } => {
            let dst = state.regs.peek();
            emit_rvalue(state, value, dst, print_table);
            emit_store_to_lvalue(state, target, dst);
        }
        Stat::Read { target, .. } => {
            let dst = state.regs.peek();
            emit_lvalue_load(state, target, dst);
            state.emit(Instr::Move {
                cond: Cond::Al,
                dst: Register::R(0),
                src: Operand2::Reg(dst),
            });
            let read_fn = match lvalue_type(state, target) {
                Type::Char => "p_read_char",
                _ => "p_read_int",
            };
            state.emit(Instr::BranchAndLink {
                target: read_fn.to_owned(),
            });
            state.emit(Instr::Move {
                cond: Cond::Al,
                dst,
                src: Operand2::Reg(Register::R(0)),
            });
            emit_store_to_lvalue(state, target, dst);
        }
        Stat::Free { value, .. } => {
            let dst = state.regs.peek();
            emit_expr_into(state, value, dst, print_table);
            state.emit(Instr::Move {
                cond: Cond::Al,
                dst: Register::R(0),
                src: Operand2::Reg(dst),
            });
            state.emit(Instr::BranchAndLink {
                target: "free".to_owned(),
            });
        }
        Stat::Return { value, .. } => {
            let dst = state.regs.peek();
            emit_expr_into(state, value, dst, print_table);
            state.emit(Instr::Move {
                cond: Cond::Al,
                dst: Register::R(0),
                src: Operand2::Reg(dst),
            });
            emit_stack_release(state, frame_size);
            state.emit(Instr::Pop(vec![Register::ProgramCounter]));
        }
        Stat::Exit { value, .. } => {
            let dst = state.regs.peek();
            emit_expr_into(state, value, dst, print_table);
            state.emit(Instr::Move {
                cond: Cond::Al,
                dst: Register::R(0),
                src: Operand2::Reg(dst),
            });
            state.emit(Instr::BranchAndLink {
                target: "exit".to_owned(),
            });
        }
        Stat::Print { value, .. } | Stat::Println { value, .. } => {
            let dst = state.regs.peek();
            emit_expr_into(state, value, dst, print_table);
            state.emit(Instr::Move {
                cond: Cond::Al,
                dst: Register::R(0),
                src: Operand2::Reg(dst),
            });
            let ty = print_table.get(&value.position()).cloned().unwrap_or(Type::Int);
            state.emit(Instr::BranchAndLink {
                target: print_routine(&ty).to_owned(),
            });
            if matches!(stat, Stat::Println { .. }) {
                state.emit(Instr::BranchAndLink {
                    target: "p_print_ln".to_owned(),
                });
            }
        }
        Stat::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            let dst = state.regs.peek();
            emit_expr_into(state, cond, dst, print_table);
            state.emit(Instr::Cmp {
                lhs: dst,
                rhs: Operand2::Imm(0),
            });
            let else_label = state.fresh_label("L_else_");
            let end_label = state.fresh_label("L_end_");
            state.emit(Instr::Branch {
                cond: Cond::Eq,
                target: else_label.clone(),
            });
            emit_block(state, then_body, print_table, frame_size);
            state.emit(Instr::Branch {
                cond: Cond::Al,
                target: end_label.clone(),
            });
            state.emit(Instr::Label(else_label));
            emit_block(state, else_body, print_table, frame_size);
            state.emit(Instr::Label(end_label));
        }
        Stat::While { cond, body, .. } => {
            let check_label = state.fresh_label("L_while_check_");
            let body_label = state.fresh_label("L_while_body_");
            state.emit(Instr::Branch {
                cond: Cond::Al,
                target: check_label.clone(),
            });
            state.emit(Instr::Label(body_label.clone()));
            emit_block(state, body, print_table, frame_size);
            state.emit(Instr::Label(check_label));
            let dst = state.regs.peek();
            emit_expr_into(state, cond, dst, print_table);
            state.emit(Instr::Cmp {
                lhs: dst,
                rhs: Operand2::Imm(1),
            });
            state.emit(Instr::Branch {
                cond: Cond::Eq,
                target: body_label,
            });
        }
        Stat::Scope { body } => emit_block(state, body, print_table, frame_size),
        Stat::Seq(a, b) => {
            emit_stat(state, a, print_table, frame_size);
            emit_stat(state, b, print_table, frame_size);
        }
    }
}

fn print_routine(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "p_print_int",
        Type::Bool => "p_print_bool",
        Type::Char => "putchar",
        Type::String => "p_print_string",
        Type::Array(elem) if matches!(**elem, Type::Char) => "p_print_string",
        _ => "p_print_reference",
    }
}

/// Converts a frame-base-relative offset into one relative to the current stack
/// pointer, which moves as inner blocks push locals.
fn stack_relative_offset(state: &CodegenState, name: &str) -> i32 {
    let declared = state
        .offset_of(name)
        .unwrap_or_else(|| panic!("codegen: identifier `{name}` has no stack slot"));
    state.stack_pointer_offset() - declared
}

fn lvalue_type(state: &CodegenState, lvalue: &LValue) -> Type {
    match lvalue {
        LValue::Ident { name, .. } => state
            .type_of(name)
            .cloned()
            .unwrap_or_else(|| panic!("codegen: identifier `{name}` has no recorded type")),
        LValue::ArrayElem { name, indices, .. } => {
            let mut ty = state
                .type_of(name)
                .cloned()
                .unwrap_or_else(|| panic!("codegen: identifier `{name}` has no recorded type"));
            for _ in indices {
                ty = match ty {
                    Type::Array(elem) => *elem,
                    other => other,
                };
            }
            ty
        }
        LValue::PairElem { fst, value, .. } => match lvalue_type(state, value) {
            Type::Pair(a, b) => *(if *fst { a } else { b }),
            _ => Type::Any,
        },
    }
}

fn emit_rvalue(state: &mut CodegenState, rvalue: &RValue, dst: Register, print_table: &PrintTable) {
    match rvalue {
        RValue::Expr(e) => emit_expr_into(state, e, dst, print_table),
        RValue::ArrayLit { elems, .. } => emit_array_literal(state, elems, dst, print_table),
        RValue::NewPair { fst, snd, .. } => emit_new_pair(state, fst, snd, dst, print_table),
        RValue::Call { name, args, .. } => emit_call(state, name, args, dst, print_table),
        RValue::PairElem { fst, value, .. } => emit_pair_elem_load(state, *fst, value, dst),
    }
}

/// Heap arrays are laid out as a leading 4-byte length word followed by
/// `len * elem_size` bytes of contiguous elements.
fn emit_array_literal(state: &mut CodegenState, elems: &[Expr], dst: Register, print_table: &PrintTable) {
    let elem_size = 4i32;
    let total = 4 + elems.len() as i32 * elem_size;
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst: Register::R(0),
        src: Operand2::Imm(total),
    });
    state.emit(Instr::BranchAndLink {
        target: "malloc".to_owned(),
    });
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst,
        src: Operand2::Reg(Register::R(0)),
    });
    let len_reg = state.regs.consume();
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst: len_reg,
        src: Operand2::Imm(elems.len() as i32),
    });
    state.emit(Instr::Store {
        src: len_reg,
        addr: dst,
        offset: 0,
    });
    state.regs.release(len_reg);

    for (i, elem) in elems.iter().enumerate() {
        let elem_reg = state.regs.consume();
        emit_expr_into(state, elem, elem_reg, print_table);
        state.emit(Instr::Store {
            src: elem_reg,
            addr: dst,
            offset: 4 + i as i32 * elem_size,
        });
        state.regs.release(elem_reg);
    }
}

fn emit_new_pair(state: &mut CodegenState, fst: &Expr, snd: &Expr, dst: Register, print_table: &PrintTable) {
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst: Register::R(0),
        src: Operand2::Imm(8),
    });
    state.emit(Instr::BranchAndLink {
        target: "malloc".to_owned(),
    });
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst,
        src: Operand2::Reg(Register::R(0)),
    });

    let elem_reg = state.regs.consume();
    emit_expr_into(state, fst, elem_reg, print_table);
    state.emit(Instr::Store {
        src: elem_reg,
        addr: dst,
        offset: 0,
    });
    emit_expr_into(state, snd, elem_reg, print_table);
    state.emit(Instr::Store {
        src: elem_reg,
        addr: dst,
        offset: 4,
    });
    state.regs.release(elem_reg);
}

/// Evaluates arguments left-to-right, pushing each onto the stack; after the call,
/// restores the stack pointer by the total argument size and moves `R0` into the
/// caller's result register.
fn emit_call(state: &mut CodegenState, name: &str, args: &[Expr], dst: Register, print_table: &PrintTable) {
    let mut total_size = 0i32;
    for arg in args.iter().rev() {
        let arg_reg = state.regs.consume();
        emit_expr_into(state, arg, arg_reg, print_table);
        state.emit(Instr::Push(vec![arg_reg]));
        state.regs.release(arg_reg);
        total_size += 4;
    }
    state.emit(Instr::BranchAndLink {
        target: format!("wacc_{name}"),
    });
    if total_size > 0 {
        state.emit(Instr::Add {
            dst: Register::StackPointer,
            lhs: Register::StackPointer,
            rhs: Operand2::Imm(total_size),
        });
    }
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst,
        src: Operand2::Reg(Register::R(0)),
    });
}

fn emit_store_to_lvalue(state: &mut CodegenState, lvalue: &LValue, src: Register) {
    match lvalue {
        LValue::Ident { name, .. } => {
            let offset = stack_relative_offset(state, name);
            state.emit(Instr::Store {
                src,
                addr: Register::StackPointer,
                offset,
            });
        }
        LValue::ArrayElem { name, indices, .. } => {
            let addr_reg = state.regs.consume();
            emit_array_element_address(state, name, indices, addr_reg);
            state.emit(Instr::Store {
                src,
                addr: addr_reg,
                offset: 0,
            });
            state.regs.release(addr_reg);
        }
        LValue::PairElem { fst, value, .. } => {
            let addr_reg = state.regs.consume();
            emit_lvalue_load(state, value, addr_reg);
            state.emit(Instr::Store {
                src,
                addr: addr_reg,
                offset: if *fst { 0 } else { 4 },
            });
            state.regs.release(addr_reg);
        }
    }
}

fn emit_lvalue_load(state: &mut CodegenState, lvalue: &LValue, dst: Register) {
    match lvalue {
        LValue::Ident { name, .. } => {
            let offset = stack_relative_offset(state, name);
            state.emit(Instr::Load {
                dst,
                addr: Register::StackPointer,
                offset,
            });
        }
        LValue::ArrayElem { name, indices, .. } => {
            emit_array_element_address(state, name, indices, dst);
            state.emit(Instr::Load { dst, addr: dst, offset: 0 });
        }
        LValue::PairElem { fst, value, .. } => emit_pair_elem_load(state, *fst, value, dst),
    }
}

fn emit_pair_elem_load(state: &mut CodegenState, fst: bool, inner: &LValue, dst: Register) {
    emit_lvalue_load(state, inner, dst);
    state.emit(Instr::Load {
        dst,
        addr: dst,
        offset: if fst { 0 } else { 4 },
    });
}

/// Computes the address of `name[indices...]` into `dst`. Array element size is
/// treated uniformly as a word: element widths below a word (`Char`/`Bool` arrays)
/// are packed the same as word arrays by this generator, a known simplification
/// relative to a fully width-aware encoder.
///
/// Each dimension after the first indexes into the array whose *pointer* is stored
/// at the previous dimension's element slot, so the previous slot must be
/// dereferenced before the next offset is added to it.
fn emit_array_element_address(state: &mut CodegenState, name: &str, indices: &[Expr], dst: Register) {
    let offset = stack_relative_offset(state, name);
    state.emit(Instr::Load {
        dst,
        addr: Register::StackPointer,
        offset,
    });
    for (dimension, index) in indices.iter().enumerate() {
        if dimension > 0 {
            state.emit(Instr::Load { dst, addr: dst, offset: 0 });
        }
        let idx_reg = state.regs.consume();
        emit_expr_into(state, index, idx_reg, &PrintTable::default());
        state.emit(Instr::Add {
            dst,
            lhs: dst,
            rhs: Operand2::Imm(4),
        });
        state.emit(Instr::Add {
            dst: idx_reg,
            lhs: idx_reg,
            rhs: Operand2::Reg(idx_reg),
        });
        state.emit(Instr::Add {
            dst: idx_reg,
            lhs: idx_reg,
            rhs: Operand2::Reg(idx_reg),
        });
        state.emit(Instr::Add {
            dst,
            lhs: dst,
            rhs: Operand2::Reg(idx_reg),
        });
        state.regs.release(idx_reg);
    }
}

fn emit_expr_into(state: &mut CodegenState, expr: &Expr, dst: Register, print_table: &PrintTable) {
    match expr {
        Expr::IntLiteral { value, .. } => state.emit(Instr::Move {
            cond: Cond::Al,
            dst,
            src: Operand2::Imm(*value),
        }),
        Expr::BoolLiteral { value, .. } => state.emit(Instr::Move {
            cond: Cond::Al,
            dst,
            src: Operand2::Imm(i32::from(*value)),
        }),
        Expr::CharLiteral { value, .. } => state.emit(Instr::Move {
            cond: Cond::Al,
            dst,
            src: Operand2::Imm(*value as i32),
        }),
        Expr::StringLiteral { value, .. } => {
            let label = state.strings.insert(value);
            state.emit(Instr::LoadLabel { dst, label });
        }
        Expr::Null { .. } => state.emit(Instr::Move {
            cond: Cond::Al,
            dst,
            src: Operand2::Imm(0),
        }),
        Expr::Ident { name, .. } => {
            let offset = stack_relative_offset(state, name);
            state.emit(Instr::Load {
                dst,
                addr: Register::StackPointer,
                offset,
            });
        }
        Expr::ArrayElem { name, indices, .. } => {
            emit_array_element_address(state, name, indices, dst);
            state.emit(Instr::Load { dst, addr: dst, offset: 0 });
        }
        Expr::PairElem { fst, value, .. } => {
            let inner = expr_as_lvalue(value);
            emit_pair_elem_load(state, *fst, &inner, dst);
        }
        Expr::Unary { op, operand, .. } => emit_unary(state, *op, operand, dst, print_table),
        Expr::Binary { op, lhs, rhs, .. } if matches!(op, BinOp::And | BinOp::Or) => {
            emit_short_circuit(state, *op, lhs, rhs, dst, print_table);
        }
        Expr::Binary { op, lhs, rhs, .. } => emit_binary(state, *op, lhs, rhs, dst, print_table),
    }
}

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

fn emit_unary(state: &mut CodegenState, op: UnOp, operand: &Expr, dst: Register, print_table: &PrintTable) {
    emit_expr_into(state, operand, dst, print_table);
    match op {
        UnOp::Not => state.emit(Instr::Xor {
            dst,
            lhs: dst,
            rhs: Operand2::Imm(1),
        }),
        UnOp::Negate => state.emit(Instr::Rsb {
            dst,
            lhs: dst,
            rhs: Operand2::Imm(0),
        }),
        UnOp::Len => state.emit(Instr::Load { dst, addr: dst, offset: 0 }),
        UnOp::Ord | UnOp::Chr => {} // representation-preserving
    }
}

fn emit_binary(state: &mut CodegenState, op: BinOp, lhs: &Expr, rhs: &Expr, dst: Register, print_table: &PrintTable) {
    emit_expr_into(state, lhs, dst, print_table);
    let rhs_reg = state.regs.consume();
    emit_expr_into(state, rhs, rhs_reg, print_table);

    match op {
        BinOp::Add => state.emit(Instr::Add {
            dst,
            lhs: dst,
            rhs: Operand2::Reg(rhs_reg),
        }),
        BinOp::Sub => state.emit(Instr::Sub {
            dst,
            lhs: dst,
            rhs: Operand2::Reg(rhs_reg),
        }),
        BinOp::Mult => state.emit(Instr::Mul {
            dst,
            lhs: dst,
            rhs: rhs_reg,
        }),
        BinOp::Div => emit_runtime_div(state, dst, rhs_reg, true),
        BinOp::Mod => emit_runtime_div(state, dst, rhs_reg, false),
        BinOp::Less => emit_comparison(state, Cond::Lt, dst, rhs_reg),
        BinOp::LessEq => emit_comparison(state, Cond::Le, dst, rhs_reg),
        BinOp::Greater => emit_comparison(state, Cond::Gt, dst, rhs_reg),
        BinOp::GreaterEq => emit_comparison(state, Cond::Ge, dst, rhs_reg),
        BinOp::Equal => emit_comparison(state, Cond::Eq, dst, rhs_reg),
        BinOp::NotEqual => emit_comparison(state, Cond::Ne, dst, rhs_reg),
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators are handled by emit_short_circuit"),
    }
    state.regs.release(rhs_reg);
}

fn emit_runtime_div(state: &mut CodegenState, dst: Register, rhs_reg: Register, is_div: bool) {
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst: Register::R(0),
        src: Operand2::Reg(dst),
    });
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst: Register::R(1),
        src: Operand2::Reg(rhs_reg),
    });
    state.emit(Instr::BranchAndLink {
        target: "__aeabi_idivmod".to_owned(),
    });
    state.emit(Instr::Move {
        cond: Cond::Al,
        dst,
        src: Operand2::Reg(if is_div { Register::R(0) } else { Register::R(1) }),
    });
}

fn emit_comparison(state: &mut CodegenState, cond: Cond, dst: Register, rhs_reg: Register) {
    state.emit(Instr::Cmp {
        lhs: dst,
        rhs: Operand2::Reg(rhs_reg),
    });
    state.emit(Instr::Move {
        cond,
        dst,
        src: Operand2::Imm(1),
    });
    state.emit(Instr::Move {
        cond: cond.negate(),
        dst,
        src: Operand2::Imm(0),
    });
}

/// `&&`/`||` short-circuit: the left operand's value already *is* the overall
/// result when it determines the outcome (`false` for `&&`, `true` for `||`), so
/// the right operand is only evaluated, overwriting `dst`, when it doesn't.
fn emit_short_circuit(state: &mut CodegenState, op: BinOp, lhs: &Expr, rhs: &Expr, dst: Register, print_table: &PrintTable) {
    emit_expr_into(state, lhs, dst, print_table);
    state.emit(Instr::Cmp {
        lhs: dst,
        rhs: Operand2::Imm(0),
    });
    let end_label = state.fresh_label(if op == BinOp::And { "L_and_end_" } else { "L_or_end_" });
    let short_circuit_cond = if op == BinOp::And { Cond::Eq } else { Cond::Ne };
    state.emit(Instr::Branch {
        cond: short_circuit_cond,
        target: end_label.clone(),
    });
    emit_expr_into(state, rhs, dst, print_table);
    state.emit(Instr::Label(end_label));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::sem::analyze;

    fn generate_src(src: &str) -> (Vec<Instr>, super::super::strpool::StringPool) {
        let program = parse(lex(src).unwrap()).unwrap();
        let result = analyze(&program);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics.records());
        generate(&program, &result.print_table)
    }

    #[test]
    fn exit_constant_moves_literal_into_r0() {
        let (instrs, _) = generate_src("begin int x = 3 ; exit x end");
        let has_exit = instrs.iter().any(|i| matches!(i, Instr::BranchAndLink { target } if target == "exit"));
        assert!(has_exit);
    }

    #[test]
    fn println_emits_both_print_and_newline_calls() {
        let (instrs, strings) = generate_src("begin println \"hi\" end");
        assert_eq!(strings.entries().len(), 1);
        assert!(instrs
            .iter()
            .any(|i| matches!(i, Instr::BranchAndLink { target } if target == "p_print_string")));
        assert!(instrs
            .iter()
            .any(|i| matches!(i, Instr::BranchAndLink { target } if target == "p_print_ln")));
    }

    #[test]
    fn duplicate_string_literals_share_one_pool_entry() {
        let (_, strings) = generate_src("begin print \"hello\" ; println \"hello\" end");
        assert_eq!(strings.entries().len(), 1);
    }

    #[test]
    fn function_body_emits_its_own_label_and_epilogue() {
        let (instrs, _) = generate_src("begin int f(int x) is return x end ; exit call f(1) end");
        assert!(instrs.iter().any(|i| matches!(i, Instr::Label(l) if l == "wacc_f")));
        assert!(instrs
            .iter()
            .any(|i| matches!(i, Instr::Pop(regs) if regs == &[Register::ProgramCounter])));
    }

    #[test]
    fn short_circuit_and_emits_a_branch_before_evaluating_rhs() {
        let (instrs, _) = generate_src("begin bool b = true && false ; exit 0 end");
        assert!(instrs.iter().any(|i| matches!(i, Instr::Branch { cond: Cond::Eq, .. })));
    }

    #[test]
    fn function_with_locals_reserves_and_releases_stack_space_around_the_return() {
        let (instrs, _) = generate_src("begin int f(int x) is int y = x + 1 ; return y end ; exit call f(1) end");
        let sub_pos = instrs
            .iter()
            .position(|i| matches!(i, Instr::Sub { dst: Register::StackPointer, .. }))
            .expect("expected a sub sp, sp, #N prologue before the locals it reserves for");
        let pop_pos = instrs
            .iter()
            .position(|i| matches!(i, Instr::Pop(regs) if regs == &[Register::ProgramCounter]))
            .expect("expected a pop {pc} epilogue");
        assert!(sub_pos < pop_pos, "sub sp must precede the function body, which precedes pop {{pc}}");
        assert!(
            matches!(instrs[pop_pos - 1], Instr::Add { dst: Register::StackPointer, .. }),
            "expected the instruction immediately before pop {{pc}} to restore sp, got {:?}",
            instrs[pop_pos - 1]
        );
    }

    #[test]
    fn reserved_frame_keeps_locals_below_the_saved_link_register() {
        let (instrs, _) = generate_src("begin int f(int x) is int y = x + 1 ; return y end ; exit call f(1) end");
        let frame_size = match instrs
            .iter()
            .find(|i| matches!(i, Instr::Sub { dst: Register::StackPointer, .. }))
            .expect("expected a sub sp, sp, #N prologue")
        {
            Instr::Sub { rhs: Operand2::Imm(n), .. } => *n,
            other => unreachable!("{other:?}"),
        };
        assert!(
            instrs.iter().all(|i| !matches!(
                i,
                Instr::Store { addr: Register::StackPointer, offset, .. } if *offset >= frame_size
            )),
            "every local's offset from the post-prologue sp must fall within the reserved frame"
        );
    }

    #[test]
    fn multi_dimensional_array_index_dereferences_the_outer_pointer() {
        let (instrs, _) = generate_src("begin int f(int[][] a) is return a[0][1] end ; exit 0 end");
        let zero_offset_loads = instrs.iter().filter(|i| matches!(i, Instr::Load { offset: 0, .. })).count();
        assert!(
            zero_offset_loads >= 2,
            "expected at least one dereference between dimensions plus the final element load"
        );
    }
}
