//! Front door of the pipeline: source text in, printed output and
//! diagnostics out.
//!
//! A [`Session`] keeps one interpreter alive across calls to [`Session::run`],
//! so globals defined by one REPL line are visible to the next, while each
//! call starts with a clean error state.

use log::{debug, info};
use thiserror::Error;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Exit status for lexical, syntax and resolution errors.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status for runtime errors.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum Failure {
    /// Scanning, parsing or resolution failed; nothing was executed.
    #[error("{}", render_all(.0))]
    Static(Vec<LoxError>),

    /// Execution started and stopped at this error.
    #[error("{0}")]
    Runtime(LoxError),
}

fn render_all(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join("\n")
}

impl Failure {
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Static(_) => EXIT_STATIC_ERROR,
            Failure::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }

    /// Every diagnostic carried by this failure, in report order.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            Failure::Static(errors) => errors.iter().collect(),
            Failure::Runtime(error) => vec![error],
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session printing to standard output.
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Scans, parses, resolves and executes `source`.
    ///
    /// Lexical and syntax errors are gathered together so one run reports all
    /// of them; any of them prevents execution.
    pub fn run(&mut self, source: &str) -> Result<(), Failure> {
        info!("Running {} byte(s) of source", source.len());

        let (tokens, mut errors) = scan_tokens(source);

        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(Failure::Static(errors));
            }
        };

        if !errors.is_empty() {
            return Err(Failure::Static(errors));
        }

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(Failure::Static)?;

        debug!("Executing {} statement(s)", statements.len());

        self.interpreter
            .interpret(&statements)
            .map_err(Failure::Runtime)
    }
}
