mod common;

#[cfg(test)]
mod class_tests {
    use rlox_tw::session::Failure;

    use crate::common::{messages, run, run_err};

    fn runtime_error(source: &str) -> String {
        let (_, failure) = run_err(source);
        assert!(matches!(failure, Failure::Runtime(_)), "{:?}", failure);
        messages(&failure).remove(0)
    }

    #[test]
    fn classes_and_instances_print() {
        let source = r#"
class Bagel {
  eat() {}
}
var bagel = Bagel();
print Bagel;
print bagel;
print bagel.eat;
"#;
        assert_eq!(run(source), "Bagel\nBagel instance\n<fn eat>\n");
    }

    #[test]
    fn fields_are_created_on_assignment() {
        let source = r#"
class Box {}
var box = Box();
box.content = "socks";
print box.content;
box.content = box.content + " and shoes";
print box.content;
"#;
        assert_eq!(run(source), "socks\nsocks and shoes\n");
    }

    #[test]
    fn methods_see_this() {
        let source = r#"
class Cake {
  taste() {
    var adjective = "delicious";
    print "The " + this.flavor + " cake is " + adjective + "!";
  }
}

var cake = Cake();
cake.flavor = "German chocolate";
cake.taste();
"#;
        assert_eq!(run(source), "The German chocolate cake is delicious!\n");
    }

    #[test]
    fn initializer_receives_arguments() {
        let source = r#"
class Point {
  init(x, y) {
    this.x = x;
    this.y = y;
  }

  sum() {
    return this.x + this.y;
  }
}

print Point(1, 2).sum();
"#;
        assert_eq!(run(source), "3\n");
    }

    #[test]
    fn initializer_always_returns_the_instance() {
        let source = r#"
class Guard {
  init(x) {
    this.x = x;
    if (x > 0) return;
    this.x = -1;
  }
}

print Guard(5).x;
print Guard(0).x;

var g = Guard(1);
print g.init(7) == g;
print g.x;
"#;
        assert_eq!(run(source), "5\n-1\ntrue\n7\n");
    }

    #[test]
    fn bound_methods_remember_their_instance() {
        let source = r#"
class Person {
  init(name) { this.name = name; }
  greet() { return "hi " + this.name; }
}

var method = Person("jane").greet;
var other = Person("bill");
other.greet = method;
print method();
print other.greet();
"#;
        assert_eq!(run(source), "hi jane\nhi jane\n");
    }

    #[test]
    fn fields_shadow_methods() {
        let source = r#"
class Thing {
  name() { return "method"; }
}
var thing = Thing();
print thing.name();
thing.name = "field";
print thing.name;
"#;
        assert_eq!(run(source), "method\nfield\n");
    }

    #[test]
    fn instances_compare_by_identity() {
        let source = r#"
class A {}
var a = A();
var b = a;
print a == b;
print a == A();
print A == A;
"#;
        assert_eq!(run(source), "true\nfalse\ntrue\n");
    }

    #[test]
    fn methods_are_inherited() {
        let source = r#"
class Doughnut {
  cook() { print "Fry until golden brown."; }
}
class BostonCream < Doughnut {}
BostonCream().cook();
"#;
        assert_eq!(run(source), "Fry until golden brown.\n");
    }

    #[test]
    fn inherited_initializer_sets_arity() {
        let source = r#"
class A { init(x) { this.x = x; } }
class B < A {}
print B(9).x;
"#;
        assert_eq!(run(source), "9\n");
        assert_eq!(
            runtime_error("class A { init(x) {} }\nclass B < A {}\nB();"),
            "[line 3] Error at ')': Expected 1 arguments but got 0."
        );
    }

    #[test]
    fn super_calls_the_superclass_method() {
        let source = r#"
class Doughnut {
  cook() { print "Fry until golden brown."; }
}

class BostonCream < Doughnut {
  cook() {
    super.cook();
    print "Pipe full of custard and coat with chocolate.";
  }
}

BostonCream().cook();
"#;
        assert_eq!(
            run(source),
            "Fry until golden brown.\nPipe full of custard and coat with chocolate.\n"
        );
    }

    #[test]
    fn super_is_fixed_at_method_definition() {
        let source = r#"
class A {
  method() { print "A method"; }
}

class B < A {
  method() { print "B method"; }
  test() { super.method(); }
}

class C < B {}

C().test();
"#;
        assert_eq!(run(source), "A method\n");
    }

    #[test]
    fn super_initializer_chain() {
        let source = r#"
class Base {
  init(n) { this.n = n; }
}

class Derived < Base {
  init(n) { super.init(n * 2); }
}

print Derived(3).n;
"#;
        assert_eq!(run(source), "6\n");
    }

    #[test]
    fn superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = \"nope\";\nclass Sub < NotAClass {}"),
            "[line 2] Error at 'NotAClass': Superclass must be a class."
        );
    }

    #[test]
    fn undefined_property() {
        assert_eq!(
            runtime_error("class A {}\nprint A().missing;"),
            "[line 2] Error at 'missing': Undefined property 'missing'."
        );
        assert_eq!(
            runtime_error("class A {}\nclass B < A {\n  m() { return super.missing; }\n}\nB().m();"),
            "[line 3] Error at 'missing': Undefined property 'missing'."
        );
    }

    #[test]
    fn only_instances_have_properties() {
        assert_eq!(
            runtime_error("var n = 1;\nprint n.size;"),
            "[line 2] Error at 'size': Only instances have properties."
        );
        assert_eq!(
            runtime_error("\"str\".length = 3;"),
            "[line 1] Error at 'length': Only instances have fields."
        );
    }
}
