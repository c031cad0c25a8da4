//! Top-level pipeline orchestration: `source text -> tokens -> AST -> (diagnostics,
//! typed AST) -> instruction stream -> assembly text`. The driver halts after
//! semantic analysis if any diagnostic was produced.

use crate::codegen;
use crate::lexer;
use crate::parser;
use crate::sem;

/// The outcome of compiling one source file, distinguishing the three failure
/// channels the CLI maps to distinct exit codes.
pub enum CompileOutcome {
    Success { assembly: String },
    SyntaxError { message: String },
    SemanticError { rendered: String },
}

/// Runs the full pipeline over `source`, the raw text of one source file.
#[must_use]
pub fn compile_source(source: &str) -> CompileOutcome {
    let tokens = match lexer::lex(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            return CompileOutcome::SyntaxError {
                message: err.to_string(),
            }
        }
    };

    let program = match parser::parse(tokens) {
        Ok(program) => program,
        Err(err) => {
            return CompileOutcome::SyntaxError {
                message: err.to_string(),
            }
        }
    };

    let analysis = sem::analyze(&program);
    if !analysis.diagnostics.is_empty() {
        return CompileOutcome::SemanticError {
            rendered: analysis.diagnostics.render_all(source),
        };
    }

    let (instrs, pool) = codegen::generate(&program, &analysis.print_table);
    let assembly = codegen::print_assembly(&instrs, &pool);
    CompileOutcome::Success { assembly }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_compile_emits_main_label() {
        match compile_source("begin int x = 3 ; exit x end") {
            CompileOutcome::Success { assembly } => assert!(assembly.contains("main:")),
            _ => panic!("expected success"),
        }
    }

    #[test]
    fn syntax_error_on_malformed_program() {
        match compile_source("begin int x = end") {
            CompileOutcome::SyntaxError { .. } => {}
            _ => panic!("expected syntax error"),
        }
    }

    #[test]
    fn semantic_error_on_type_mismatch() {
        match compile_source("begin int x = true end") {
            CompileOutcome::SemanticError { rendered } => assert!(rendered.contains("type mismatch")),
            _ => panic!("expected semantic error"),
        }
    }
}
