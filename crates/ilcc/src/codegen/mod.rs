//! Code generation: AST to typed ARM instruction stream, and the printer that
//! renders that stream as assembly text.

pub mod emit;
pub mod instr;
pub mod printer;
pub mod regpool;
pub mod state;
pub mod strpool;

pub use emit::generate;
pub use printer::print_assembly;
