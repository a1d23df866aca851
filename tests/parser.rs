mod common;

use pretty_assertions::assert_eq;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::scanner::tokenize;
use rox::stmt::Stmt;

fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
    let (tokens, lex_errors) = tokenize(source);
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    let mut parser = Parser::new(tokens);
    let statements = parser.parse();
    (statements, parser.take_errors())
}

fn printed(source: &str) -> Vec<String> {
    let (statements, errors) = parse(source);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    statements.iter().map(AstPrinter::print_stmt).collect()
}

#[test]
fn precedence_climbs_from_equality_to_unary() {
    assert_eq!(
        printed("1 + 2 * 3 == -4 / 2 > 1;"),
        vec!["(; (== (+ 1.0 (* 2.0 3.0)) (> (/ (- 4.0) 2.0) 1.0)))"]
    );
}

#[test]
fn logical_operators_bind_looser_than_equality() {
    assert_eq!(
        printed("a or b and c == d;"),
        vec!["(; (or a (and b (== c d))))"]
    );
}

#[test]
fn calls_and_property_chains_are_left_to_right() {
    assert_eq!(
        printed("a.b(1)(2).c = 3;"),
        vec!["(; (= (. (call (call (. a b) 1.0) 2.0) c) 3.0))"]
    );
}

#[test]
fn declarations_render_with_their_bodies() {
    assert_eq!(
        printed("fun add(a, b) { return a + b; } class P < Q { init(x) { this.x = x; } }"),
        vec![
            "(fun add(a b) (block (return (+ a b))))",
            "(class P < Q (method init(x) (block (; (= (. this x) x)))))",
        ]
    );
}

#[test]
fn if_else_binds_to_nearest_if() {
    assert_eq!(
        printed("if (a) if (b) print 1; else print 2;"),
        vec!["(if a (if b (print 1.0) (print 2.0)))"]
    );
}

#[test]
fn two_broken_statements_give_exactly_two_errors() {
    let source = "var = 1;\nprint \"ok\";\nprint (1;";
    let (statements, errors) = parse(source);

    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 3] Error at ';': Expect ')' after expression.",
        ]
    );
    assert_eq!(statements.len(), 1);

    // Nothing runs when the program has syntax errors.
    let (report, out) = common::run(source);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(out, "");

    // The surviving statement behaves normally on its own.
    assert_eq!(common::output("print \"ok\";"), "ok\n");
}

#[test]
fn argument_cap_is_reported_without_aborting_the_statement() {
    let (statements, errors) = parse("f(1, 2, 3, 4, 5, 6, 7, 8, 9); print 1;");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at '9': Can't have more than 8 arguments."
    );
    assert_eq!(statements.len(), 2);
}

#[test]
fn missing_semicolon_at_end_of_file() {
    let (_, errors) = parse("print 1");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at end: Expect ';' after value."
    );
}

#[test]
fn errors_carry_columns() {
    let (_, errors) = parse("var x = ;");

    assert_eq!(errors[0].position(), Some((1, 9)));
}
