//! Typed ARM instruction vocabulary emitted by code generation and rendered to text
//! by the assembly printer. Every variant has exactly one fixed textual rendering;
//! the printer performs no semantic decisions.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    R(u8),
    StackPointer,
    LinkRegister,
    ProgramCounter,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::R(n) => write!(f, "r{n}"),
            Self::StackPointer => write!(f, "sp"),
            Self::LinkRegister => write!(f, "lr"),
            Self::ProgramCounter => write!(f, "pc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Al,
}

impl Cond {
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Al => "",
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
            Self::Al => Self::Al,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand2 {
    Reg(Register),
    Imm(i32),
    Label(String),
}

impl fmt::Display for Operand2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "{r}"),
            Self::Imm(n) => write!(f, "#{n}"),
            Self::Label(l) => write!(f, "={l}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Move { cond: Cond, dst: Register, src: Operand2 },
    Load { dst: Register, addr: Register, offset: i32 },
    LoadLabel { dst: Register, label: String },
    Store { src: Register, addr: Register, offset: i32 },
    Push(Vec<Register>),
    Pop(Vec<Register>),
    Mul { dst: Register, lhs: Register, rhs: Register },
    Add { dst: Register, lhs: Register, rhs: Operand2 },
    Sub { dst: Register, lhs: Register, rhs: Operand2 },
    Rsb { dst: Register, lhs: Register, rhs: Operand2 },
    And { dst: Register, lhs: Register, rhs: Operand2 },
    Orr { dst: Register, lhs: Register, rhs: Operand2 },
    Xor { dst: Register, lhs: Register, rhs: Operand2 },
    Cmp { lhs: Register, rhs: Operand2 },
    Branch { cond: Cond, target: String },
    BranchAndLink { target: String },
    BranchAndLinkReg { target: Register },
    Label(String),
    Directive(String),
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { cond, dst, src } => write!(f, "    mov{} {dst}, {src}", cond.suffix()),
            Self::Load { dst, addr, offset } => write!(f, "    ldr {dst}, [{addr}, #{offset}]"),
            Self::LoadLabel { dst, label } => write!(f, "    ldr {dst}, ={label}"),
            Self::Store { src, addr, offset } => write!(f, "    str {src}, [{addr}, #{offset}]"),
            Self::Push(regs) => write!(f, "    push {{{}}}", join(regs)),
            Self::Pop(regs) => write!(f, "    pop {{{}}}", join(regs)),
            Self::Mul { dst, lhs, rhs } => write!(f, "    mul {dst}, {lhs}, {rhs}"),
            Self::Add { dst, lhs, rhs } => write!(f, "    add {dst}, {lhs}, {rhs}"),
            Self::Sub { dst, lhs, rhs } => write!(f, "    sub {dst}, {lhs}, {rhs}"),
            Self::Rsb { dst, lhs, rhs } => write!(f, "    rsb {dst}, {lhs}, {rhs}"),
            Self::And { dst, lhs, rhs } => write!(f, "    and {dst}, {lhs}, {rhs}"),
            Self::Orr { dst, lhs, rhs } => write!(f, "    orr {dst}, {lhs}, {rhs}"),
            Self::Xor { dst, lhs, rhs } => write!(f, "    eor {dst}, {lhs}, {rhs}"),
            Self::Cmp { lhs, rhs } => write!(f, "    cmp {lhs}, {rhs}"),
            Self::Branch { cond, target } => write!(f, "    b{} {target}", cond.suffix()),
            Self::BranchAndLink { target } => write!(f, "    bl {target}"),
            Self::BranchAndLinkReg { target } => write!(f, "    blx {target}"),
            Self::Label(name) => write!(f, "{name}:"),
            Self::Directive(text) => write!(f, "{text}"),
        }
    }
}

fn join(regs: &[Register]) -> String {
    regs.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_move_with_condition() {
        let instr = Instr::Move {
            cond: Cond::Eq,
            dst: Register::R(0),
            src: Operand2::Imm(1),
        };
        assert_eq!(instr.to_string(), "    moveq r0, #1");
    }

    #[test]
    fn renders_unconditional_move_without_suffix() {
        let instr = Instr::Move {
            cond: Cond::Al,
            dst: Register::R(4),
            src: Operand2::Reg(Register::R(5)),
        };
        assert_eq!(instr.to_string(), "    mov r4, r5");
    }

    #[test]
    fn renders_push_and_pop() {
        assert_eq!(Instr::Push(vec![Register::LinkRegister]).to_string(), "    push {lr}");
        assert_eq!(Instr::Pop(vec![Register::ProgramCounter]).to_string(), "    pop {pc}");
    }

    #[test]
    fn cond_negate_is_involutive() {
        for cond in [Cond::Eq, Cond::Ne, Cond::Lt, Cond::Le, Cond::Gt, Cond::Ge] {
            assert_eq!(cond.negate().negate(), cond);
        }
    }
}
