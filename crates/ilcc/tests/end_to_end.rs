//! Whole-pipeline tests exercising [`ilcc::compile_source`] the way the CLI driver does,
//! checking which of the three outcome channels each program lands in.

use ilcc::CompileOutcome;

macro_rules! expect_success_tests {
    ($($name:ident: $code:literal;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< $name _compiles_to_assembly >]() {
                    match ilcc::compile_source($code) {
                        CompileOutcome::Success { assembly } => assert!(assembly.contains("main:")),
                        CompileOutcome::SyntaxError { message } => panic!("unexpected syntax error: {message}"),
                        CompileOutcome::SemanticError { rendered } => panic!("unexpected semantic error: {rendered}"),
                    }
                }
            }
        )*
    }
}

macro_rules! expect_semantic_error_tests {
    ($($name:ident: $code:literal, $expect_contains:literal;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< $name _is_rejected >]() {
                    match ilcc::compile_source($code) {
                        CompileOutcome::SemanticError { rendered } => {
                            assert!(rendered.contains($expect_contains), "rendered: {rendered}");
                        }
                        CompileOutcome::Success { .. } => panic!("expected a semantic error, compiled successfully"),
                        CompileOutcome::SyntaxError { message } => panic!("expected a semantic error, got syntax error: {message}"),
                    }
                }
            }
        )*
    }
}

expect_success_tests! {
    exits_with_a_constant: "begin exit 7 end";
    declares_and_exits_a_variable: "begin int x = 3 ; exit x end";
    empty_array_literal_declares_as_any: "begin int[] a = [] ; exit 0 end";
    calls_a_user_function: "begin int f(int x) is return x end ; exit call f(5) end";
}

#[test]
fn duplicate_string_literals_share_one_pool_entry() {
    let source = r#"begin println "hi" ; println "hi" ; exit 0 end"#;
    match ilcc::compile_source(source) {
        CompileOutcome::Success { assembly } => {
            assert_eq!(assembly.matches(".msg_0:").count(), 1);
            assert!(!assembly.contains(".msg_1:"));
        }
        _ => panic!("expected successful compile, got a failure"),
    }
}

expect_semantic_error_tests! {
    declare_type_mismatch: "begin int x = true end", "type mismatch";
    variable_undefined_after_scope_exit: "begin begin int x = 1 end ; exit x end", "undefined";
    call_with_wrong_argument_count: "begin int f(int x) is return x end ; exit call f(1, 2) end", "argument(s)";
}
