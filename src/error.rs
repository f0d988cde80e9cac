use thiserror::Error;

/// Failures that stop a run.
///
/// Problems confined to one line or one sample are not errors: a line is
/// rejected to the error sink and a bad call becomes a missing sample.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header: {message}")]
    Header { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The allele cache or the result stream lost its synchronization
    /// guarantees. Never recovered from.
    #[error("Coordination fault: {message}")]
    Coordination { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn header(message: impl Into<String>) -> Self {
        Self::Header {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn coordination(message: impl Into<String>) -> Self {
        Self::Coordination {
            message: message.into(),
        }
    }
}
