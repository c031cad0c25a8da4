//! Position-annotated abstract syntax tree produced by the parser and consumed by
//! semantic analysis and code generation.

use crate::pos::{Position, Spanned};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub funcs: Vec<Func>,
    pub body: Vec<Stat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub position: Position,
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub position: Position,
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stat {
    Skip,
    Declare {
        position: Position,
        ty: Type,
        name: String,
        value: RValue,
    },
    Assign {
        position: Position,
        target: LValue,
        value: RValue,
    },
    Read {
        position: Position,
        target: LValue,
    },
    Free {
        position: Position,
        value: Expr,
    },
    Return {
        position: Position,
        value: Expr,
    },
    Exit {
        position: Position,
        value: Expr,
    },
    Print {
        position: Position,
        value: Expr,
    },
    Println {
        position: Position,
        value: Expr,
    },
    If {
        position: Position,
        cond: Expr,
        then_body: Vec<Stat>,
        else_body: Vec<Stat>,
    },
    While {
        position: Position,
        cond: Expr,
        body: Vec<Stat>,
    },
    Scope {
        body: Vec<Stat>,
    },
    Seq(Box<Stat>, Box<Stat>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Ident {
        position: Position,
        name: String,
    },
    ArrayElem {
        position: Position,
        name: String,
        indices: Vec<Expr>,
    },
    PairElem {
        position: Position,
        fst: bool,
        value: Box<LValue>,
    },
}

impl LValue {
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Ident { position, .. }
            | Self::ArrayElem { position, .. }
            | Self::PairElem { position, .. } => *position,
        }
    }

    /// Reinterprets an lvalue as the expression it would denote when read, used
    /// wherever an lvalue is type-checked or loaded the same way a plain expression
    /// is (for example the array/pair-index subexpressions inside it).
    #[must_use]
    pub fn as_expr(&self) -> Expr {
        match self {
            Self::Ident { position, name } => Expr::Ident {
                position: *position,
                name: name.clone(),
            },
            Self::ArrayElem {
                position,
                name,
                indices,
            } => Expr::ArrayElem {
                position: *position,
                name: name.clone(),
                indices: indices.clone(),
            },
            Self::PairElem { position, fst, value } => Expr::PairElem {
                position: *position,
                fst: *fst,
                value: Box::new(value.as_expr()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Expr(Expr),
    ArrayLit {
        position: Position,
        elems: Vec<Expr>,
    },
    NewPair {
        position: Position,
        fst: Expr,
        snd: Expr,
    },
    Call {
        position: Position,
        name: String,
        args: Vec<Expr>,
    },
    PairElem {
        position: Position,
        fst: bool,
        value: Box<LValue>,
    },
}

impl RValue {
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Expr(e) => e.position(),
            Self::ArrayLit { position, .. }
            | Self::NewPair { position, .. }
            | Self::Call { position, .. }
            | Self::PairElem { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral {
        position: Position,
        value: i32,
    },
    BoolLiteral {
        position: Position,
        value: bool,
    },
    CharLiteral {
        position: Position,
        value: char,
    },
    StringLiteral {
        position: Position,
        value: String,
    },
    Null {
        position: Position,
    },
    Ident {
        position: Position,
        name: String,
    },
    ArrayElem {
        position: Position,
        name: String,
        indices: Vec<Expr>,
    },
    PairElem {
        position: Position,
        fst: bool,
        value: Box<Expr>,
    },
    Unary {
        position: Position,
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        position: Position,
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::IntLiteral { position, .. }
            | Self::BoolLiteral { position, .. }
            | Self::CharLiteral { position, .. }
            | Self::StringLiteral { position, .. }
            | Self::Null { position }
            | Self::Ident { position, .. }
            | Self::ArrayElem { position, .. }
            | Self::PairElem { position, .. }
            | Self::Unary { position, .. }
            | Self::Binary { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Negate,
    Len,
    Ord,
    Chr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mult,
    Div,
    Mod,
    Add,
    Sub,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
    And,
    Or,
}

/// The type lattice used by semantic analysis. `Any`, `Null`, `Error` and `InnerPair`
/// are not spellable in source text; they exist only as values the equivalence
/// relation in [`crate::sem::types_eq`] reasons about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Char,
    String,
    Array(Box<Type>),
    Pair(Box<Type>, Box<Type>),
    /// The element type of a pair position whose own element type is itself a pair,
    /// e.g. the `fst` of `pair(pair(int, int), int)`: erased to an opaque pair type
    /// rather than tracked recursively, matching how the language treats nested pairs.
    InnerPair,
    /// Matches any type; assigned to `null` and to array-literal holes before their
    /// element type is known.
    Any,
    /// The specific type of the `null` literal; equivalent to any pair type.
    Null,
    /// A placeholder produced after a type error has already been reported, so later
    /// checks against it never cascade into spurious secondary diagnostics.
    Error,
}

#[allow(dead_code)]
pub type SpannedExpr = Spanned<Expr>;
