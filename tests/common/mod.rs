use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::{Lox, RunReport};

/// A `Write` sink the test keeps a handle to after giving it to the
/// interpreter.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `source` in a fresh interpreter; returns the report and everything
/// printed.
#[allow(dead_code)]
pub fn run(source: &str) -> (RunReport, String) {
    let capture = Capture::default();
    let mut lox = Lox::with_output(Box::new(capture.clone()));
    let report = lox.run(source);

    (report, capture.text())
}

/// Output of a program expected to run cleanly.
#[allow(dead_code)]
pub fn output(source: &str) -> String {
    let (report, out) = run(source);
    assert!(
        report.success(),
        "unexpected errors: {:?} / {:?}",
        report.errors,
        report.runtime_error
    );
    out
}
