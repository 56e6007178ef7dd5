pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod token;
pub mod value;

/// Free stack below which the tree walkers switch to a fresh segment.
const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each segment allocated once the red zone is reached.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Runs `f` on the current stack, or on a newly allocated segment when fewer
/// than [`STACK_RED_ZONE`] bytes remain.  Recursive descent through parsing,
/// resolution and evaluation goes through here, so nesting depth is bounded
/// by the parser and the call-depth guard rather than the host thread.
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}
