//! The pipeline driver: source text → tokens → statements → resolved program →
//! execution.
//!
//! A [`Lox`] owns one [`Interpreter`], so globals survive between
//! [`Lox::run`] calls and a host can feed it consecutive chunks.  Diagnostics
//! are not printed here; each run returns a [`RunReport`] and the host decides
//! what to do with it, optionally through a [`Reporter`].
//!
//! Resolved distances of every chunk that ran are kept for the life of the
//! driver, since functions it defined can be called from later chunks.  A
//! chunk rejected by the resolver leaves nothing behind.

use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::tokenize;
use crate::stmt::Stmt;

/// The two error channels a host listens on.
pub trait Reporter {
    /// A static (lexical, syntax or resolution) error.
    fn error(&mut self, error: &LoxError);

    /// The runtime error that stopped execution.
    fn runtime_error(&mut self, error: &LoxError);
}

/// Writes diagnostics to stderr, each followed by the offending source line
/// when it can be located.
pub struct StderrReporter<'s> {
    source: &'s str,
}

impl<'s> StderrReporter<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn print(&self, error: &LoxError) {
        eprintln!("{}", error);

        if let Some(context) = error.render_context(self.source) {
            eprintln!("{}", context);
        }
    }
}

impl Reporter for StderrReporter<'_> {
    fn error(&mut self, error: &LoxError) {
        self.print(error);
    }

    fn runtime_error(&mut self, error: &LoxError) {
        self.print(error);
    }
}

/// Outcome of one [`Lox::run`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Static errors, grouped by phase (lexical, then syntax, then
    /// resolution) and in source order within each phase.
    pub errors: Vec<LoxError>,

    /// Set when execution started and was aborted.
    pub runtime_error: Option<LoxError>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        !self.had_error() && !self.had_runtime_error()
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime_error.is_some()
    }

    /// Forward every diagnostic to `reporter`.
    pub fn emit(&self, reporter: &mut dyn Reporter) {
        for error in &self.errors {
            reporter.error(error);
        }

        if let Some(error) = &self.runtime_error {
            reporter.runtime_error(error);
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Driver printing to standard output.
    pub fn new() -> Self {
        Self::from_interpreter(Interpreter::new())
    }

    /// Driver whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self::from_interpreter(Interpreter::with_output(out))
    }

    fn from_interpreter(interpreter: Interpreter) -> Self {
        info!("Lox driver ready");

        Self {
            interpreter,
            next_id: 0,
        }
    }

    /// Scan, parse and resolve `source`; execute it only if all three
    /// phases came back clean.
    pub fn run(&mut self, source: &str) -> RunReport {
        let mut report = RunReport::default();

        let (tokens, lex_errors) = tokenize(source);
        report.errors.extend(lex_errors);

        let first_id: usize = self.next_id;
        let mut parser = Parser::with_first_id(tokens, first_id);
        let statements: Vec<Stmt> = parser.parse();
        self.next_id = parser.next_id();
        report.errors.extend(parser.take_errors());

        // A tree with holes in it is not worth resolving.
        if report.had_error() {
            info!("Skipping resolution: {} static error(s)", report.errors.len());
            return report;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            report.errors.extend(errors);
            self.interpreter.forget(first_id..self.next_id);
            info!("Skipping execution: {} resolution error(s)", report.errors.len());
            return report;
        }

        debug!("Executing {} statement(s)", statements.len());

        if let Err(error) = self.interpreter.interpret(&statements) {
            report.runtime_error = Some(error);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprId;

    #[derive(Default)]
    struct Collect {
        static_errors: Vec<String>,
        runtime_errors: Vec<String>,
    }

    impl Reporter for Collect {
        fn error(&mut self, error: &LoxError) {
            self.static_errors.push(error.to_string());
        }

        fn runtime_error(&mut self, error: &LoxError) {
            self.runtime_errors.push(error.to_string());
        }
    }

    #[test]
    fn static_errors_skip_execution() {
        let mut lox = Lox::with_output(Box::new(std::io::sink()));
        let report = lox.run("print 1; print ;");

        assert!(report.had_error());
        assert!(!report.had_runtime_error());

        let mut collect = Collect::default();
        report.emit(&mut collect);
        assert_eq!(collect.static_errors, vec!["[line 1] Error at ';': Expect expression."]);
        assert!(collect.runtime_errors.is_empty());
    }

    #[test]
    fn runtime_error_goes_to_its_own_channel() {
        let mut lox = Lox::with_output(Box::new(std::io::sink()));
        let report = lox.run("print -\"x\";");

        let mut collect = Collect::default();
        report.emit(&mut collect);
        assert!(collect.static_errors.is_empty());
        assert_eq!(collect.runtime_errors, vec!["Operand must be a number.\n[line 1]"]);
    }

    #[test]
    fn rejected_chunk_leaves_no_resolutions() {
        let mut lox = Lox::with_output(Box::new(std::io::sink()));

        let report = lox.run("{ var a = 1; print a; } return 1;");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(lox.interpreter.local_depth(ExprId(0)), None);

        assert!(lox.run("{ var b = 2; print b; }").success());
        assert_eq!(lox.interpreter.local_depth(ExprId(1)), Some(0));
    }

    #[test]
    fn globals_survive_between_runs() {
        let mut lox = Lox::with_output(Box::new(std::io::sink()));

        assert!(lox.run("var a = 1; fun f() { return a; }").success());
        assert!(lox.run("a = a + f(); { var b = a; }").success());
        assert!(lox.run("if (a != 2) nope();").success());
    }
}
