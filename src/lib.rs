//! An ECMAScript 5 execution engine: lexer, parser and a tree-walking
//! interpreter over a garbage-collected object heap.

pub mod ast;
pub mod error;
mod interpreter;
mod lexer;
pub mod parser;
pub mod types;

pub use error::EngineError;
pub use interpreter::{EngineConfig, Interpreter};
pub use types::{JsString, JsValue};

/// Stack given to evaluation threads; deeply nested scripts recurse deeply.
pub const STACK_SIZE: usize = 64 * 1024 * 1024;

/// Runs `script` in a fresh interpreter and returns ToString of its
/// completion value.
pub fn evaluate_script<T: AsRef<str>>(script: T) -> Result<String, EngineError> {
    let script = script.as_ref().to_string();
    log::debug!("evaluate_script called with script len {}", script.len());
    let worker = std::thread::Builder::new()
        .name("esengine-eval".into())
        .stack_size(STACK_SIZE)
        .spawn(move || {
            let mut interp = Interpreter::new();
            let value = interp.evaluate(&script)?;
            interp.value_to_string(&value)
        })?;
    match worker.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_script_stringifies_completion() {
        assert_eq!(evaluate_script("1 + 2").unwrap(), "3");
        assert_eq!(evaluate_script("[1, 'a', null]").unwrap(), "1,a,");
        assert_eq!(evaluate_script("var x = 5;").unwrap(), "undefined");
    }

    #[test]
    fn evaluate_script_reports_errors() {
        let err = evaluate_script("throw new TypeError('nope')").unwrap_err();
        assert_eq!(err.to_string(), "Uncaught TypeError: nope");
        assert!(matches!(evaluate_script("var = 1"), Err(EngineError::Parse(_))));
    }
}
