//! Renders the typed instruction stream and string pool as ARM assembly text,
//! matching the `.data`/`.text` section layout of the driver's output contract.
//!
//! This is a pure, total function from `(instructions, pool)` to `String`: every
//! instruction variant has exactly one fixed textual rendering and no semantic
//! decisions are made here.

use super::instr::Instr;
use super::strpool::StringPool;

#[must_use]
pub fn print_assembly(instrs: &[Instr], pool: &StringPool) -> String {
    let mut out = String::new();

    out.push_str(".data\n\n");
    for (index, entry) in pool.entries().iter().enumerate() {
        out.push_str(&format!("{}:\n", super::strpool::StringEntry::label(index)));
        out.push_str(&format!("    .word {}\n", entry.raw.len()));
        out.push_str(&format!("    .ascii \"{}\\0\"\n\n", entry.escaped));
    }

    out.push_str(".text\n\n.global main\n");
    for instr in instrs {
        out.push_str(&format!("{instr}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::instr::{Cond, Instr, Operand2, Register};

    #[test]
    fn renders_empty_data_section_header_even_with_no_strings() {
        let pool = StringPool::new();
        let text = print_assembly(&[], &pool);
        assert!(text.starts_with(".data"));
        assert!(text.contains(".text"));
    }

    #[test]
    fn renders_one_data_entry_per_pool_string() {
        let mut pool = StringPool::new();
        pool.insert("hi");
        let text = print_assembly(&[], &pool);
        assert!(text.contains(".msg_0:"));
        assert!(text.contains(".word 2"));
        assert!(text.contains("\"hi\\0\""));
    }

    #[test]
    fn renders_instructions_in_order() {
        let instrs = vec![
            Instr::Label("main".to_owned()),
            Instr::Move {
                cond: Cond::Al,
                dst: Register::R(0),
                src: Operand2::Imm(0),
            },
        ];
        let text = print_assembly(&instrs, &StringPool::new());
        let main_pos = text.find("main:").unwrap();
        let mov_pos = text.find("mov r0, #0").unwrap();
        assert!(main_pos < mov_pos);
    }
}
