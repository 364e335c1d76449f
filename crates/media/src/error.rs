use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transform parameter is non-numeric or outside its allowed set.
    #[error("{message}")]
    InvalidParameter { message: String },

    /// Concat operands disagree on row count after orientation normalization.
    #[error("Images are incompatible for concatenation due to difference in height.")]
    DimensionMismatch { left: usize, right: usize },

    #[error("image has no pixels left to encode")]
    EmptyImage,

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
