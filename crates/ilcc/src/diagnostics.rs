//! Structured diagnostics shared by semantic analysis and its rendering at the driver.

use crate::ast::Type;
use crate::pos::Position;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    RedefinedFunction { name: String },
    RedefinedVariable { name: String },
    UndefinedVariable { name: String },
    UndefinedFunction { name: String },
    TypeMismatch,
    IncorrectNumberOfArgs { name: String, expected: usize, got: usize },
    ArrayDimensionMismatch { name: String },
    UnexpectedReturn,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedefinedFunction { name } => write!(f, "function `{name}` is already defined"),
            Self::RedefinedVariable { name } => write!(f, "variable `{name}` is already defined in this scope"),
            Self::UndefinedVariable { name } => write!(f, "undefined variable `{name}`"),
            Self::UndefinedFunction { name } => write!(f, "undefined function `{name}`"),
            Self::TypeMismatch => write!(f, "type mismatch"),
            Self::IncorrectNumberOfArgs { name, expected, got } => write!(
                f,
                "function `{name}` expects {expected} argument(s) but {got} were given"
            ),
            Self::ArrayDimensionMismatch { name } => {
                write!(f, "too many indices applied to array `{name}`")
            }
            Self::UnexpectedReturn => write!(f, "`return` is not valid outside a function body"),
        }
    }
}

/// A single semantic diagnostic, carrying enough structure to render either a short
/// one-liner or a full source-annotated message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
    pub got: Option<Type>,
    pub expected: Vec<Type>,
    pub context: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, position: Position) -> Self {
        Self {
            kind,
            position,
            got: None,
            expected: Vec::new(),
            context: String::new(),
        }
    }

    #[must_use]
    pub fn with_got(mut self, ty: Type) -> Self {
        self.got = Some(ty);
        self
    }

    #[must_use]
    pub fn with_expected(mut self, tys: impl IntoIterator<Item = Type>) -> Self {
        self.expected.extend(tys);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Renders this diagnostic against the originating source text, including the
    /// offending line and a caret under the reported column.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let mut out = format!("error at {}: {}", self.position, self.kind);
        if let Some(got) = &self.got {
            out.push_str(&format!("\n  got: {got:?}"));
        }
        if !self.expected.is_empty() {
            out.push_str(&format!("\n  expected one of: {:?}", self.expected));
        }
        if !self.context.is_empty() {
            out.push_str(&format!("\n  {}", self.context));
        }
        if let Some(line) = source.lines().nth(self.position.line.saturating_sub(1) as usize) {
            let caret_col = self.position.column.saturating_sub(1) as usize;
            let caret = " ".repeat(caret_col) + "^";
            out.push_str(&format!("\n  {line}\n  {caret}"));
        }
        out
    }
}

/// Accumulates every diagnostic produced during one analysis pass without aborting
/// traversal; see the print-table/diagnostics accumulate-by-mutable-reference design.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn render_all(&self, source: &str) -> String {
        self.records
            .iter()
            .map(|d| d.render(source))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
