//! Function table and block-nested scope table.

use crate::ast::Type;
use ahash::AHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub return_type: Type,
    pub param_types: Vec<Type>,
}

/// Built once, before any function body is checked. Grounded on the same
/// build-the-whole-table-up-front discipline used for interning a crate's entire
/// program text before resolving any single name.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: AHashMap<String, FunctionSignature>,
}

impl FunctionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function, returning `false` if the name was already registered
    /// (the caller reports `RedefinedFunction` but keeps the original signature).
    pub fn declare(&mut self, name: &str, signature: FunctionSignature) -> bool {
        if self.functions.contains_key(name) {
            return false;
        }
        self.functions.insert(name.to_owned(), signature);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }
}

/// Block-nested identifier scope: a stack of frames, innermost last. Lookup walks
/// from the innermost frame outward; declaration only ever touches the innermost
/// frame, so shadowing across frames is free but redeclaration within one frame is
/// rejected by the caller before it ever reaches here.
#[derive(Debug, Default)]
pub struct ScopeTable {
    frames: Vec<AHashMap<String, Type>>,
}

impl ScopeTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![AHashMap::new()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(AHashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// `true` if `name` is already declared in the innermost frame only.
    #[must_use]
    pub fn declared_in_current_frame(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.contains_key(name))
    }

    pub fn declare(&mut self, name: &str, ty: Type) {
        self.frames
            .last_mut()
            .expect("ScopeTable always has at least one frame")
            .insert(name.to_owned(), ty);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_declaration_shadows_outer() {
        let mut scopes = ScopeTable::new();
        scopes.declare("x", Type::Int);
        scopes.push_frame();
        scopes.declare("x", Type::Bool);
        assert_eq!(scopes.lookup("x"), Some(&Type::Bool));
        scopes.pop_frame();
        assert_eq!(scopes.lookup("x"), Some(&Type::Int));
    }

    #[test]
    fn redeclaration_is_only_checked_within_current_frame() {
        let mut scopes = ScopeTable::new();
        scopes.declare("x", Type::Int);
        scopes.push_frame();
        assert!(!scopes.declared_in_current_frame("x"));
        scopes.declare("x", Type::Bool);
        assert!(scopes.declared_in_current_frame("x"));
    }

    #[test]
    fn function_table_rejects_duplicate_names() {
        let mut functions = FunctionTable::new();
        let sig = FunctionSignature {
            return_type: Type::Int,
            param_types: vec![],
        };
        assert!(functions.declare("f", sig.clone()));
        assert!(!functions.declare("f", sig));
    }
}
