use thiserror::Error;

/// sqlsnap errors
#[derive(Error, Debug)]
pub enum SqlSnapError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Failed to script {kind} '{name}': {message}")]
    Scripting {
        kind: &'static str,
        name: String,
        message: String,
    },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
