use crate::parser::ParseError;

/// Failures reported to the embedding host.
#[derive(thiserror::Error, Debug, Clone)]
pub enum EngineError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("Uncaught {}", render_uncaught(.name, .message))]
    Uncaught { name: String, message: String },
    #[error("{0}")]
    Io(String),
}

fn render_uncaught(name: &str, message: &str) -> String {
    match (name.is_empty(), message.is_empty()) {
        (true, _) => message.to_string(),
        (false, true) => name.to_string(),
        (false, false) => format!("{name}: {message}"),
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}
