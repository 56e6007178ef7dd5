mod common;

#[cfg(test)]
mod resolver_tests {
    use rlox_tw as lox;

    use lox::ast::{Expr, Stmt};
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::scan_tokens;
    use lox::session::Failure;

    use crate::common::{messages, run, run_err};

    fn static_errors(source: &str) -> Vec<String> {
        let (output, failure) = run_err(source);

        assert!(matches!(failure, Failure::Static(_)), "{:?}", failure);
        assert_eq!(output, "", "nothing may run after a static error");

        messages(&failure)
    }

    #[test]
    fn return_at_top_level() {
        assert_eq!(
            static_errors("print \"before\";\nreturn 1;"),
            vec!["[line 2] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn return_value_from_initializer() {
        assert_eq!(
            static_errors("class A {\n  init() { return 1; }\n}"),
            vec!["[line 2] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn bare_return_in_initializer_is_allowed() {
        assert_eq!(run("class A { init() { return; } }\nprint A();"), "A instance\n");
    }

    #[test]
    fn class_inheriting_from_itself() {
        assert_eq!(
            static_errors("class Oops < Oops {}"),
            vec!["[line 1] Error at 'Oops': A class can't inherit from itself."]
        );
    }

    #[test]
    fn local_read_in_own_initializer() {
        assert_eq!(
            static_errors("var a = 1;\n{\n  var a = a;\n}"),
            vec!["[line 3] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn global_may_read_itself_in_initializer() {
        // Globals are not tracked, so this is a runtime lookup of the old `a`.
        assert_eq!(run("var a = 1;\nvar a = a + 1;\nprint a;"), "2\n");
    }

    #[test]
    fn this_outside_class() {
        assert_eq!(
            static_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            static_errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn super_outside_class() {
        assert_eq!(
            static_errors("super.method();"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
    }

    #[test]
    fn super_without_superclass() {
        assert_eq!(
            static_errors("class A {\n  m() { super.m(); }\n}"),
            vec!["[line 2] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn duplicate_local_declaration() {
        assert_eq!(
            static_errors("{\n  var a = 1;\n  var a = 2;\n}"),
            vec!["[line 3] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            static_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn every_resolution_error_is_reported() {
        assert_eq!(
            static_errors("return;\nprint this;\n{ var b = b; }"),
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
                "[line 3] Error at 'b': Can't read local variable in its own initializer.",
            ]
        );
    }

    #[test]
    fn closure_keeps_binding_seen_at_declaration() {
        let source = r#"
var a = "global";
{
  fun show() { print a; }
  show();
  var a = "block";
  show();
}
"#;
        assert_eq!(run(source), "global\nglobal\n");
    }

    #[test]
    fn records_hop_counts_for_locals_only() {
        let (tokens, _) = scan_tokens("var g = 0;\n{ var a = 1; { print a; print g; } }");
        let program: Vec<Stmt> = Parser::new(tokens).parse().expect("parses");

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter)
            .resolve(&program)
            .expect("resolves");

        let inner: &[Stmt] = match &program[1] {
            Stmt::Block(outer) => match &outer[1] {
                Stmt::Block(inner) => inner,
                other => panic!("expected inner block, got {:?}", other),
            },
            other => panic!("expected block, got {:?}", other),
        };

        let id_of = |stmt: &Stmt| match stmt {
            Stmt::Print(Expr::Variable { id, .. }) => *id,
            other => panic!("expected print of a variable, got {:?}", other),
        };

        assert_eq!(interpreter.resolved_depth(id_of(&inner[0])), Some(1));
        assert_eq!(interpreter.resolved_depth(id_of(&inner[1])), None);
    }
}
