mod common;

#[cfg(test)]
mod session_tests {
    use rlox_tw::session::{Failure, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR};

    use crate::common::{messages, run_err, session};

    #[test]
    fn definitions_persist_between_runs() {
        let (mut session, buffer) = session();

        session.run("var a = 1;").expect("defines a");
        session.run("fun twice(x) { return x * 2; }").expect("defines twice");
        session.run("print twice(a);").expect("uses both");

        assert_eq!(buffer.contents(), "2\n");
    }

    #[test]
    fn closures_survive_across_runs() {
        let (mut session, buffer) = session();

        session
            .run("fun make() { var n = 0; fun f() { n = n + 1; return n; } return f; }")
            .expect("defines make");
        session.run("var counter = make();").expect("creates closure");
        session.run("print counter();").expect("first call");
        session.run("print counter();").expect("second call");

        assert_eq!(buffer.contents(), "1\n2\n");
    }

    #[test]
    fn classes_survive_across_runs() {
        let (mut session, buffer) = session();

        session
            .run("class Greeter { init(who) { this.who = who; } hi() { print \"hi \" + this.who; } }")
            .expect("defines class");
        session.run("var g = Greeter(\"there\");").expect("constructs");
        session.run("g.hi();").expect("calls method");

        assert_eq!(buffer.contents(), "hi there\n");
    }

    #[test]
    fn errors_do_not_poison_the_session() {
        let (mut session, buffer) = session();

        let static_failure = session.run("var;").expect_err("syntax error");
        assert_eq!(static_failure.exit_code(), EXIT_STATIC_ERROR);

        let runtime_failure = session.run("print -nil;").expect_err("runtime error");
        assert_eq!(runtime_failure.exit_code(), EXIT_RUNTIME_ERROR);

        session.run("print \"still alive\";").expect("recovers");
        assert_eq!(buffer.contents(), "still alive\n");
    }

    #[test]
    fn runtime_error_inside_call_leaves_globals_scope() {
        let (mut session, _buffer) = session();

        session
            .run("fun f() { var local = 1; return -\"x\"; }")
            .expect("defines f");
        session.run("f();").expect_err("fails inside f");

        let failure = session.run("print local;").expect_err("local is gone");
        assert_eq!(
            messages(&failure),
            vec!["[line 1] Error at 'local': Undefined variable 'local'."]
        );
    }

    #[test]
    fn globals_assigned_before_a_runtime_error_keep_their_values() {
        let (mut session, buffer) = session();

        session
            .run("var x = 1;\nx = 2;\nprint nil + 1;")
            .expect_err("fails on third line");
        session.run("print x;").expect("x is still defined");

        assert_eq!(buffer.contents(), "2\n");
    }

    #[test]
    fn two_malformed_statements_give_two_errors_and_no_output() {
        let (output, failure) = run_err("print \"before\";\nprint ;\nvar 1;");

        assert_eq!(output, "");
        assert_eq!(failure.exit_code(), EXIT_STATIC_ERROR);
        assert_eq!(
            messages(&failure),
            vec![
                "[line 2] Error at ';': Expect expression.",
                "[line 3] Error at '1': Expect variable name.",
            ]
        );
    }

    #[test]
    fn lexical_and_syntax_errors_are_reported_together() {
        let (output, failure) = run_err("print \"ok\";\nvar x = @;");

        assert_eq!(output, "");
        assert_eq!(
            messages(&failure),
            vec![
                "[line 2] Error: Unexpected character.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn lexical_error_alone_prevents_execution() {
        let (output, failure) = run_err("print \"ok\";\n$");

        assert_eq!(output, "");
        assert!(matches!(failure, Failure::Static(ref errors) if errors.len() == 1));
    }

    #[test]
    fn static_failure_renders_one_error_per_line() {
        let (_, failure) = run_err("return;\nprint this;");

        assert_eq!(
            failure.to_string(),
            "[line 1] Error at 'return': Can't return from top-level code.\n\
             [line 2] Error at 'this': Can't use 'this' outside of a class."
        );
    }
}
