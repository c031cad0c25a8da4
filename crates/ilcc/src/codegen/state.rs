//! The value bundle threaded through code generation: available registers, the
//! identifier-to-stack-offset map, the running stack-pointer offset, and the string
//! pool. Grounded on the same "central mutable bundle passed by `&mut` through every
//! call" shape the namespace/builder state uses, generalized from a bytecode-builder
//! discipline to a stack-offset one.

use super::instr::Instr;
use super::regpool::RegisterPool;
use super::strpool::StringPool;
use crate::ast::Type;
use ahash::{AHashMap, AHashSet};

/// The sentinel key recording the stack-pointer offset at function-body entry, so a
/// block scope can roll the offset back after its own locals go out of scope.
const ORIGINAL_SP: &str = "originalSP";

/// Sizes in bytes for the 32-bit little-endian target: `Int` is a full word, `Bool`
/// and `Char` are single bytes, everything else (string/array/pair) is a pointer.
#[must_use]
pub fn type_size(ty: &Type) -> i32 {
    match ty {
        Type::Bool | Type::Char => 1,
        _ => 4,
    }
}

pub struct CodegenState {
    pub regs: RegisterPool,
    pub strings: StringPool,
    pub instrs: Vec<Instr>,
    idents: AHashMap<String, i32>,
    ident_types: AHashMap<String, Type>,
    stack_pointer_offset: i32,
    used_stack_size: i32,
    function_names: AHashSet<String>,
    label_counter: usize,
}

/// A restore point for a block's identifier bindings, captured on scope entry and
/// applied on scope exit.
pub struct ScopeMark {
    idents: AHashMap<String, i32>,
    stack_pointer_offset: i32,
}

impl CodegenState {
    #[must_use]
    pub fn new(function_names: AHashSet<String>) -> Self {
        Self {
            regs: RegisterPool::new(),
            strings: StringPool::new(),
            instrs: Vec::new(),
            idents: AHashMap::new(),
            ident_types: AHashMap::new(),
            stack_pointer_offset: 0,
            used_stack_size: 0,
            function_names,
            label_counter: 0,
        }
    }

    pub fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    #[must_use]
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    #[must_use]
    pub fn is_function(&self, name: &str) -> bool {
        self.function_names.contains(name)
    }

    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<i32> {
        self.idents.get(name).copied()
    }

    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.ident_types.get(name)
    }

    /// Called once at the start of a function body, after the LR push, to capture
    /// the frame base that parameter and block-rollback offsets are measured from.
    pub fn enter_function_frame(&mut self) {
        self.stack_pointer_offset = 0;
        self.used_stack_size = 0;
        self.idents.clear();
        self.ident_types.clear();
        self.idents.insert(ORIGINAL_SP.to_owned(), 0);
    }

    /// Binds a parameter at a positive offset relative to the frame base; offsets
    /// are assigned in source order as each parameter is bound.
    pub fn bind_param(&mut self, name: &str, ty: &Type) {
        let size = type_size(ty);
        let offset = size + self.stack_pointer_offset;
        self.idents.insert(name.to_owned(), offset);
        self.ident_types.insert(name.to_owned(), ty.clone());
        self.stack_pointer_offset += size;
    }

    /// Allocates stack space for a new local and binds it at the resulting offset.
    pub fn bind_local(&mut self, name: &str, ty: &Type) {
        let size = type_size(ty);
        self.stack_pointer_offset += size;
        self.used_stack_size = self.used_stack_size.max(self.stack_pointer_offset);
        self.idents.insert(name.to_owned(), self.stack_pointer_offset);
        self.ident_types.insert(name.to_owned(), ty.clone());
    }

    #[must_use]
    pub fn used_stack_size(&self) -> i32 {
        self.used_stack_size
    }

    /// Snapshots current bindings before entering a nested block.
    #[must_use]
    pub fn mark_scope(&self) -> ScopeMark {
        ScopeMark {
            idents: self.idents.clone(),
            stack_pointer_offset: self.stack_pointer_offset,
        }
    }

    /// Rolls identifier bindings and the stack-pointer offset back to a prior mark
    /// when a block scope ends, so outer code sees none of the inner declarations.
    pub fn restore_scope(&mut self, mark: ScopeMark) {
        self.idents = mark.idents;
        self.stack_pointer_offset = mark.stack_pointer_offset;
    }

    #[must_use]
    pub fn stack_pointer_offset(&self) -> i32 {
        self.stack_pointer_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_frame_resets_offsets() {
        let mut state = CodegenState::new(AHashSet::default());
        state.enter_function_frame();
        state.bind_param("x", &Type::Int);
        assert_eq!(state.offset_of("x"), Some(4));
        assert_eq!(state.offset_of(ORIGINAL_SP), Some(0));
    }

    #[test]
    fn scope_restore_undoes_inner_declarations() {
        let mut state = CodegenState::new(AHashSet::default());
        state.enter_function_frame();
        state.bind_param("x", &Type::Int);
        let mark = state.mark_scope();
        state.bind_local("y", &Type::Int);
        assert!(state.offset_of("y").is_some());
        state.restore_scope(mark);
        assert!(state.offset_of("y").is_none());
        assert!(state.offset_of("x").is_some());
    }

    #[test]
    fn fresh_labels_are_monotonic_and_distinct() {
        let mut state = CodegenState::new(AHashSet::default());
        let a = state.fresh_label("L");
        let b = state.fresh_label("L");
        assert_ne!(a, b);
    }
}
