//! The type-equivalence relation used for assignment, return, argument, and operator
//! checks.

use crate::ast::Type;

/// `a ≡ b`: symmetric-ish equivalence used everywhere a value of one type is
/// consumed where another is expected. `Any`, `Null`, and `Error` are wildcards;
/// everything else requires structural agreement.
#[must_use]
pub fn type_eq(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Any, _) | (_, Type::Any) => true,
        (Type::Error, _) | (_, Type::Error) => true,
        (Type::Null, Type::Pair(..) | Type::InnerPair | Type::Null) => true,
        (Type::Pair(..) | Type::InnerPair, Type::Null) => true,
        (Type::Int, Type::Int) | (Type::Bool, Type::Bool) | (Type::Char, Type::Char) | (Type::String, Type::String) => {
            true
        }
        (Type::Array(elem_a), Type::Array(elem_b)) => {
            type_eq(elem_a, elem_b) || is_char_array(a) && matches!(b, Type::String) || is_char_array(b) && matches!(a, Type::String)
        }
        // An array of Char is assignable to String and vice versa.
        (Type::Array(elem), Type::String) | (Type::String, Type::Array(elem)) => matches!(**elem, Type::Char),
        (Type::Pair(a1, a2), Type::Pair(b1, b2)) => pair_elem_eq(a1, b1) && pair_elem_eq(a2, b2),
        (Type::Pair(..), Type::InnerPair) | (Type::InnerPair, Type::Pair(..)) => true,
        (Type::InnerPair, Type::InnerPair) => true,
        _ => false,
    }
}

fn is_char_array(ty: &Type) -> bool {
    matches!(ty, Type::Array(elem) if matches!(**elem, Type::Char))
}

/// Pair-element positions erase any nested pair to [`Type::InnerPair`], so a
/// concrete pair on one side and `InnerPair` on the other are always equivalent at
/// this one level of nesting.
fn pair_elem_eq(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::InnerPair, Type::Pair(..)) | (Type::Pair(..), Type::InnerPair) => true,
        (Type::InnerPair, Type::InnerPair) => true,
        _ => type_eq(a, b),
    }
}

/// Erases a concrete pair type down to `InnerPair` for use as a pair's own element
/// type, matching `NewPair`'s pair-structural-erasure rule.
#[must_use]
pub fn erase_inner(ty: &Type) -> Type {
    match ty {
        Type::Pair(..) => Type::InnerPair,
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_types_are_reflexive() {
        assert!(type_eq(&Type::Int, &Type::Int));
        assert!(type_eq(&Type::Bool, &Type::Bool));
        assert!(!type_eq(&Type::Int, &Type::Bool));
    }

    #[test]
    fn any_and_error_are_universal_wildcards() {
        assert!(type_eq(&Type::Any, &Type::Int));
        assert!(type_eq(&Type::Error, &Type::Bool));
        assert!(type_eq(&Type::Array(Box::new(Type::Int)), &Type::Any));
    }

    #[test]
    fn null_matches_any_pair() {
        let pair = Type::Pair(Box::new(Type::Int), Box::new(Type::Int));
        assert!(type_eq(&Type::Null, &pair));
        assert!(type_eq(&pair, &Type::Null));
        assert!(!type_eq(&Type::Null, &Type::Int));
    }

    #[test]
    fn char_array_is_equivalent_to_string() {
        assert!(type_eq(&Type::Array(Box::new(Type::Char)), &Type::String));
    }

    #[test]
    fn inner_pair_matches_any_concrete_pair_at_element_position() {
        let lhs = Type::Pair(
            Box::new(Type::InnerPair),
            Box::new(Type::Int),
        );
        let rhs = Type::Pair(
            Box::new(Type::Pair(Box::new(Type::Int), Box::new(Type::Int))),
            Box::new(Type::Int),
        );
        assert!(type_eq(&lhs, &rhs));
    }

    #[test]
    fn erase_inner_collapses_nested_pairs() {
        let nested = Type::Pair(Box::new(Type::Int), Box::new(Type::Int));
        assert_eq!(erase_inner(&nested), Type::InnerPair);
        assert_eq!(erase_inner(&Type::Int), Type::Int);
    }
}
