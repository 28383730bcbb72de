//! Property-based tests for the compiler.
//!
//! - integer literals inside the 15 bit range compile to a single push, larger ones are
//!   rejected by the lexer
//! - expressions produce one instruction per term and one per operator
//! - control flow labels are unique and every one of them is jumped to
//! - compiling the same source twice gives the same text

use std::collections::HashSet;

use jack_lib::compile;
use jack_lib::lexer::LexError;
use jack_lib::CompilationError;
use proptest::prelude::*;

fn in_main(locals: &str, body: &str) -> String {
    format!("class Main {{ function void main() {{ {locals} {body} return; }} }}")
}

fn arb_term() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u16..=32767).prop_map(|n| n.to_string()),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(String::from),
    ]
}

fn arb_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["+", "-", "*", "/", "&", "|", "<", ">", "="])
}

/// `t0 op t1 op t2 ...` together with the number of terms
fn arb_expression() -> impl Strategy<Value = (String, usize)> {
    (arb_term(), prop::collection::vec((arb_op(), arb_term()), 0..8)).prop_map(|(first, rest)| {
        let mut expr = first;
        for (op, term) in &rest {
            expr.push_str(&format!(" {op} {term}"));
        }
        (expr, rest.len() + 1)
    })
}

#[derive(Debug, Clone, Copy)]
enum Flow {
    If,
    IfElse,
    While,
}

fn arb_flow() -> impl Strategy<Value = Vec<Flow>> {
    prop::collection::vec(
        prop_oneof![Just(Flow::If), Just(Flow::IfElse), Just(Flow::While)],
        1..6,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn literals_in_range_are_pushed(n in 0u16..=32767) {
        let vm = compile(&in_main("var int x;", &format!("let x = {n};"))).unwrap();
        let expected = format!("push constant {n}\npop local 0\n");
        prop_assert!(vm.contains(&expected), "{}", vm);
    }

    #[test]
    fn literals_out_of_range_are_rejected(n in 32768u32..10_000_000) {
        let err = compile(&in_main("var int x;", &format!("let x = {n};"))).unwrap_err();
        prop_assert!(
            matches!(
                &err,
                CompilationError::Lex(LexError::IntegerOutOfRange { text, .. }) if *text == n.to_string()
            ),
            "{}",
            err
        );
    }

    #[test]
    fn one_instruction_per_term_and_operator((expr, n_terms) in arb_expression()) {
        let vm = compile(&in_main("var int a, b, c, r;", &format!("let r = {expr};"))).unwrap();
        let lines: Vec<_> = vm.lines().collect();
        // header, expression, `pop local 3`, `push constant 0`, `return`
        prop_assert_eq!(lines.len(), 1 + (2 * n_terms - 1) + 3);
        prop_assert_eq!(lines[lines.len() - 3], "pop local 3");
    }

    #[test]
    fn labels_are_unique_and_used(flow in arb_flow()) {
        let body: String = flow
            .iter()
            .map(|f| match f {
                Flow::If => "if (a) { let a = 1; }",
                Flow::IfElse => "if (a) { let a = 1; } else { let a = 2; }",
                Flow::While => "while (a) { let a = a - 1; }",
            })
            .collect();
        let vm = compile(&in_main("var int a;", &body)).unwrap();

        let mut defined = HashSet::new();
        let mut used = HashSet::new();
        for line in vm.lines() {
            if let Some(label) = line.strip_prefix("label ") {
                prop_assert!(defined.insert(label), "{} defined twice", label);
            } else if let Some(label) = line.strip_prefix("if-goto ").or_else(|| line.strip_prefix("goto ")) {
                used.insert(label);
            }
        }
        let expected: usize = flow
            .iter()
            .map(|f| match f {
                Flow::If => 1,
                Flow::IfElse | Flow::While => 2,
            })
            .sum();
        prop_assert_eq!(defined.len(), expected);
        prop_assert_eq!(defined, used);
    }

    #[test]
    fn compiling_twice_gives_identical_output((expr, _) in arb_expression(), flow in arb_flow()) {
        let body: String = flow
            .iter()
            .map(|f| match f {
                Flow::While => format!("while ({expr}) {{ let a = a - 1; }}"),
                _ => format!("if ({expr}) {{ do Output.printInt({expr}); }} else {{ let b = 0; }}"),
            })
            .collect();
        let src = in_main("var int a, b, c;", &body);
        prop_assert_eq!(compile(&src).unwrap(), compile(&src).unwrap());
    }
}
