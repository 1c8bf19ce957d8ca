use crate::types::JsValue;
use std::fmt;

/// The native error constructors an engine-internal failure maps onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Eval,
    Range,
    Reference,
    Syntax,
    Type,
    Uri,
    /// Host failure with no more specific kind; surfaces as a plain `Error`.
    Native,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Eval => "EvalError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Uri => "URIError",
            ErrorKind::Native => "Error",
        }
    }
}

/// Failure signalled by an engine algorithm.
///
/// `Native` errors are materialized into Error objects lazily, when they cross into
/// script-visible territory (a `catch` clause or the top level). `Thrown` carries a
/// value produced by a `throw` statement or an already-materialized error.
#[derive(Clone, Debug)]
pub enum JsError {
    Native { kind: ErrorKind, message: String },
    Thrown(JsValue),
}

pub type JsResult<T> = Result<T, JsError>;

impl JsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsError::Native {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsError::Native { kind, message } => write!(f, "{}: {message}", kind.name()),
            JsError::Thrown(value) => write!(f, "{value}"),
        }
    }
}
