//! Errors for POM patching and analysis.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PombumpError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("file not found: {path}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("resource limit exceeded: {message}")]
    ResourceLimit { message: String },

    #[error("failed to parse pom.xml: {message}")]
    ParseError { message: String },

    #[error("failed to serialize pom.xml: {0}")]
    SerializeError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PombumpError>;

impl PombumpError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn resource_limit(message: impl Into<String>) -> Self {
        Self::ResourceLimit {
            message: message.into(),
        }
    }
}

impl From<quick_xml::Error> for PombumpError {
    fn from(err: quick_xml::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}
