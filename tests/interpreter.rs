mod common;

use pretty_assertions::assert_eq;

use common::{output, run, Capture};
use rox::Lox;

fn runtime_error(source: &str) -> (String, String) {
    let (report, out) = run(source);
    assert!(report.errors.is_empty(), "static errors: {:?}", report.errors);

    let error = report
        .runtime_error
        .map(|e| e.to_string())
        .unwrap_or_default();
    (error, out)
}

// ── values & operators ─────────────────────────────────────────────────────

#[test]
fn arithmetic_and_display() {
    assert_eq!(
        output("print 1 + 2; print 7 / 2; print -3 * 2; print 10 - 0.5; print (1 + 2) * 3;"),
        "3\n3.5\n-6\n9.5\n9\n"
    );
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(
        output("print 1 / 0; print -1 / 0; print 0 / 0 == 0 / 0;"),
        "Infinity\n-Infinity\nfalse\n"
    );
}

#[test]
fn negative_zero_displays_as_zero() {
    assert_eq!(
        output("print -0; print 0 * -1; print \"x\" + -0;"),
        "0\n0\nx0\n"
    );
}

#[test]
fn string_concatenation_is_asymmetric() {
    assert_eq!(output("print \"1\" + 2; print \"a\" + \"b\";"), "12\nab\n");

    let (error, _) = runtime_error("print 2 + \"1\";");
    assert_eq!(error, "Left operand must be a string to concat strings.\n[line 1]");
}

#[test]
fn truthiness_and_equality() {
    let program = r#"
        print !nil;
        print !0;
        print !"";
        print nil == false;
        print 1 == 1;
        print "a" != "a";
        print nil == nil;
    "#;

    assert_eq!(output(program), "true\nfalse\nfalse\nfalse\ntrue\nfalse\ntrue\n");
}

#[test]
fn logical_operators_return_operands_and_short_circuit() {
    let program = r#"
        print nil or "fallback";
        print 1 and 2;
        print false and undefined_name;
        print "hit" or undefined_name;
    "#;

    assert_eq!(output(program), "fallback\n2\nfalse\nhit\n");
}

#[test]
fn operand_type_errors() {
    assert_eq!(runtime_error("print -\"a\";").0, "Operand must be a number.\n[line 1]");
    assert_eq!(runtime_error("print 1 < \"2\";").0, "Operands must be numbers.\n[line 1]");
    assert_eq!(
        runtime_error("print nil + nil;").0,
        "Operands must be two numbers or two strings.\n[line 1]"
    );
}

// ── statements & scope ─────────────────────────────────────────────────────

#[test]
fn blocks_shadow_and_restore() {
    let program = r#"
        var a = "outer";
        {
            var a = "inner";
            print a;
        }
        print a;
    "#;

    assert_eq!(output(program), "inner\nouter\n");
}

#[test]
fn uninitialised_variable_is_nil() {
    assert_eq!(output("var x; print x;"), "nil\n");
}

#[test]
fn while_and_for_loops() {
    let program = r#"
        var i = 0;
        while (i < 3) { print i; i = i + 1; }
        for (var j = 0; j < 2; j = j + 1) print j;
    "#;

    assert_eq!(output(program), "0\n1\n2\n0\n1\n");
}

#[test]
fn for_loop_variable_is_scoped_to_the_loop() {
    let (error, out) = runtime_error("for (var k = 0; k < 1; k = k + 1) {} print k;");

    assert_eq!(out, "");
    assert_eq!(error, "Undefined variable 'k'.\n[line 1]");
}

#[test]
fn output_before_a_runtime_error_is_kept() {
    let (error, out) = runtime_error("print \"first\";\nprint missing;\nprint \"never\";");

    assert_eq!(out, "first\n");
    assert_eq!(error, "Undefined variable 'missing'.\n[line 2]");
}

// ── functions & closures ───────────────────────────────────────────────────

#[test]
fn recursion_and_early_return() {
    let program = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(15);

        fun first_even(limit) {
            for (var i = 1; i < limit; i = i + 1) {
                if (i / 2 == 2) return i;
            }
            return nil;
        }
        print first_even(10);
        print first_even(3);
    "#;

    assert_eq!(output(program), "610\n4\nnil\n");
}

#[test]
fn counters_keep_independent_state() {
    let program = r#"
        fun make_counter() {
            var count = 0;
            fun inc() { count = count + 1; return count; }
            return inc;
        }
        var a = make_counter();
        var b = make_counter();
        a(); a();
        print a();
        print b();
    "#;

    assert_eq!(output(program), "3\n1\n");
}

#[test]
fn callable_display() {
    assert_eq!(
        output("fun f() {} class C {} print f; print clock; print C; print C();"),
        "<fn f>\n<native fn>\nC\nC instance\n"
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(output("print clock() > 1000000000;"), "true\n");
}

#[test]
fn call_errors() {
    assert_eq!(
        runtime_error("\"text\"();").0,
        "Can only call functions and classes.\n[line 1]"
    );
    assert_eq!(
        runtime_error("fun f(a, b) {}\nf(1);").0,
        "Expected 2 arguments but got 1.\n[line 2]"
    );
}

// ── classes ────────────────────────────────────────────────────────────────

#[test]
fn fields_methods_and_initializer() {
    let program = r#"
        class Point {
            init(x, y) { this.x = x; this.y = y; }
            sum() { return this.x + this.y; }
        }
        var p = Point(1, 2);
        print p.sum();
        p.x = 10;
        print p.sum();
        var m = p.sum;
        print m();
    "#;

    assert_eq!(output(program), "3\n12\n12\n");
}

#[test]
fn initializer_returns_the_instance() {
    let program = r#"
        class Box {
            init() { this.v = 1; return; }
        }
        var b = Box();
        print b.init() == b;
    "#;

    assert_eq!(output(program), "true\n");
}

#[test]
fn fields_shadow_methods() {
    let program = r#"
        class C { m() { return "method"; } }
        var c = C();
        c.m = "field";
        print c.m;
    "#;

    assert_eq!(output(program), "field\n");
}

#[test]
fn super_dispatches_from_the_defining_class() {
    let program = r#"
        class A {
            init() { print "A.init"; }
            greet() { return "A.greet"; }
        }
        class B < A {
            greet() { return "B>" + super.greet(); }
        }
        var b = B();
        print b.greet();
    "#;

    // B has no init of its own, so constructing it runs no initializer.
    assert_eq!(output(program), "B>A.greet\n");
}

#[test]
fn super_skips_the_receivers_own_class() {
    let program = r#"
        class A { method() { print "A method"; } }
        class B < A {
            method() { print "B method"; }
            test() { super.method(); }
        }
        class C < B {}
        C().test();
    "#;

    assert_eq!(output(program), "A method\n");
}

#[test]
fn inherited_methods_are_found_through_the_chain() {
    let program = r#"
        class A { hello() { return "hi from A"; } }
        class B < A {}
        class C < B {}
        print C().hello();
    "#;

    assert_eq!(output(program), "hi from A\n");
}

#[test]
fn property_errors() {
    assert_eq!(
        runtime_error("var n = 1; print n.x;").0,
        "Only instances have properties.\n[line 1]"
    );
    assert_eq!(
        runtime_error("var n = 1; n.x = 2;").0,
        "Only instances have fields.\n[line 1]"
    );
    assert_eq!(
        runtime_error("class C {} print C().nope;").0,
        "Undefined property 'nope'.\n[line 1]"
    );
    assert_eq!(
        runtime_error("var NotAClass = 1; class C < NotAClass {}").0,
        "Superclass must be a class.\n[line 1]"
    );
}

// ── driver ─────────────────────────────────────────────────────────────────

#[test]
fn same_source_gives_same_output() {
    let program = r#"
        class Acc {
            init() { this.total = 0; }
            add(n) { this.total = this.total + n; return this; }
        }
        var acc = Acc();
        for (var i = 1; i <= 4; i = i + 1) acc.add(i);
        print acc.total;
        print "done " + acc.total;
    "#;

    let first = output(program);
    assert_eq!(first, "10\ndone 10\n");
    assert_eq!(output(program), first);
}

#[test]
fn consecutive_runs_share_globals() {
    let capture = Capture::default();
    let mut lox = Lox::with_output(Box::new(capture.clone()));

    assert!(lox.run("var greeting = \"hello\";").success());
    assert!(lox.run("fun shout() { print greeting + \"!\"; }").success());

    let report = lox.run("shout(); print undefined;");
    assert!(report.had_runtime_error());

    assert!(lox.run("{ var local = greeting; print local; }").success());

    assert_eq!(capture.text(), "hello!\nhello\n");
}
