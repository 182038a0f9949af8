pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod tokenizer;

use std::{cell::RefCell, io::Write, rc::Rc};

use interpreter::{Interpreter, Value};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] tokenizer::LexError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Runtime(#[from] interpreter::RuntimeError),
}

/// Runs a source program through the whole pipeline, writing print output to
/// `stdout` as it happens, and returns the final value.
pub fn run(source: &str, stdout: Rc<RefCell<dyn Write>>) -> Result<Value, Error> {
    let tokens = tokenizer::tokens(source)?;
    let program = parser::program(&tokens)?;
    let mut interpreter = Interpreter::new(stdout);
    Ok(interpreter.interpret(&program)?)
}
