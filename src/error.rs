use thiserror::Error;

/// Everything that can go wrong while compiling a template.
///
/// All of these are caller programming errors raised at construction time;
/// none of them are transient.
#[derive(Debug, Error)]
pub enum Error {
    #[error("value of type {found} cannot be written as a template literal")]
    UnsupportedLiteralType { found: String },

    #[error("invalid argument expression: {context}")]
    InvalidArgumentExpression { context: String },

    #[error("IN condition has {count} alternatives, at most {max} are allowed")]
    TooManyAlternatives { count: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unsupported(found: impl Into<String>) -> Self {
        Error::UnsupportedLiteralType {
            found: found.into(),
        }
    }

    pub(crate) fn invalid_argument(context: impl Into<String>) -> Self {
        Error::InvalidArgumentExpression {
            context: context.into(),
        }
    }
}
