#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rlox_tw::interpreter::Interpreter;
use rlox_tw::session::{Failure, Session};

/// In-memory sink handed to the interpreter so tests can read what `print`
/// wrote.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("print output is UTF-8")
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose output is captured.
pub fn session() -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    (Session::with_interpreter(interpreter), buffer)
}

/// Runs `source` in a fresh session and returns the printed output.
/// Panics with the diagnostics if the run fails.
pub fn run(source: &str) -> String {
    let (mut session, buffer) = session();

    if let Err(failure) = session.run(source) {
        panic!("program failed:\n{}\noutput so far:\n{}", failure, buffer.contents());
    }

    buffer.contents()
}

/// Runs `source` expecting failure; returns the output printed before it and
/// the failure.
pub fn run_err(source: &str) -> (String, Failure) {
    let (mut session, buffer) = session();

    match session.run(source) {
        Ok(()) => panic!("program unexpectedly succeeded:\n{}", buffer.contents()),
        Err(failure) => (buffer.contents(), failure),
    }
}

/// Rendered diagnostics of a failure, one per entry.
pub fn messages(failure: &Failure) -> Vec<String> {
    failure.errors().iter().map(|e| e.to_string()).collect()
}
