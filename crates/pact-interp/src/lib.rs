//! Tree-walking executor for the Pact language. Takes a finished
//! `pact_parser::Arena` and runs it once, printing each `!:` assignment
//! and accumulating the final variable environment.

mod executor;

pub use executor::Executor;

#[cfg(test)]
mod tests {
    use super::*;
    use pact_common::Value;
    use pact_lexer::lex_line;
    use pact_parser::{Arena, Parser};

    fn parse(lines: &[&str]) -> Arena {
        let mut parser = Parser::new();
        for (i, line) in lines.iter().enumerate() {
            let (tokens, _) = lex_line(line, i);
            parser.parse_line(&tokens, i);
        }
        assert!(!parser.is_terminated(), "parse failed for {lines:?}");
        parser.into_arena()
    }

    fn run(lines: &[&str]) -> (Executor, String) {
        let arena = parse(lines);
        let mut exec = Executor::new();
        let mut out = Vec::new();
        exec.run(&arena, &mut out);
        (exec, String::from_utf8(out).unwrap())
    }

    #[test]
    fn simple_assignment_and_output() {
        let (exec, out) = run(&["x: 3 + 4", "!: x"]);
        assert!(!exec.is_terminated());
        assert_eq!(out, "7\n");
        assert_eq!(exec.globals(), vec![("x".to_string(), Value::Int(7))]);
    }

    #[test]
    fn scope_return_hides_locals() {
        let (mut exec, out) = run(&["y: (@ a': 5 a')", "!: y"]);
        assert!(!exec.is_terminated());
        assert_eq!(out, "5\n");
        assert_eq!(exec.take_diagnostics(), vec![]);
        let globals = exec.globals();
        assert_eq!(globals, vec![("y".to_string(), Value::Int(5))]);
        assert!(globals.iter().all(|(name, _)| name != "a"));
    }

    #[test]
    fn cycle_collects_descending_sequence() {
        let (exec, out) = run(&["n: 3", "r: [n : n - 1]", "!: n"]);
        assert!(!exec.is_terminated());
        assert_eq!(out, "0\n");
        let globals = exec.globals();
        assert_eq!(globals[0], ("n".to_string(), Value::Int(0)));
        assert_eq!(
            globals[1],
            ("r".to_string(), Value::Seq(vec![Value::Int(3), Value::Int(2), Value::Int(1)]))
        );
    }

    #[test]
    fn cycle_whose_predicate_fails_immediately_yields_empty_sequence() {
        let (exec, _out) = run(&["n: 0", "r: [n : n - 1]"]);
        assert!(!exec.is_terminated());
        assert_eq!(exec.globals()[1], ("r".to_string(), Value::Seq(vec![])));
    }

    #[test]
    fn condex_if_arm() {
        let (exec, out) = run(&["x: 10", "y: (? x : 10 ; 20)", "!: y"]);
        assert!(!exec.is_terminated());
        assert_eq!(out, "10\n");
        assert_eq!(exec.globals()[1], ("y".to_string(), Value::Int(10)));
    }

    #[test]
    fn condex_else_arm() {
        let (exec, out) = run(&["x: 0 - 1", "y: (? x : 10 ; 20)", "!: y"]);
        assert!(!exec.is_terminated());
        assert_eq!(out, "20\n");
    }

    #[test]
    fn undefined_global_name_is_fatal() {
        let (mut exec, out) = run(&["!: zzz"]);
        assert!(exec.is_terminated());
        assert_eq!(out, "");
        let diags = exec.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Undefined global name zzz");
    }

    #[test]
    fn output_sink_never_becomes_a_readable_variable() {
        let (exec, _out) = run(&["!: 1"]);
        assert!(exec.globals().iter().all(|(name, _)| name != "!"));
    }

    #[test]
    fn globals_dump_snapshot_of_a_representative_program() {
        let (exec, _out) = run(&["n: 3", "r: [n : n - 1]", "y: (@ a': 5 a')"]);
        let dump: String = exec
            .globals()
            .iter()
            .map(|(name, value)| format!("{name} : {value}\n"))
            .collect();
        insta::assert_snapshot!(dump, @r###"
        n : 0
        r : [3, 2, 1]
        y : 5
        "###);
    }
}
