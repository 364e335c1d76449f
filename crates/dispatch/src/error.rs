use std::error::Error as StdError;

use pixbot_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Please specify an action you'd like to execute on the image.\nIf you're unsure, please refer to 'help' for assistance."
    )]
    MissingAction,

    #[error("Invalid image action specified. Please refer to the 'help' for assistance.")]
    InvalidAction { caption: String },

    #[error("Degrees may only be 90, 180 or 270.")]
    InvalidDegree { degree: i64 },

    #[error("You need to upload more than one image in order to concat.")]
    MissingPeerImage,

    #[error("None user message received")]
    EmptyMessage,

    #[error(transparent)]
    Media(#[from] pixbot_media::Error),

    #[error("{detail}")]
    Storage { detail: String },

    #[error("{detail}")]
    Queue { detail: String },

    #[error("{detail}")]
    Lookup { detail: String },

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The detection service reported a non-success status.
    #[error("prediction failed with status {status}: {detail}")]
    Prediction { status: u16, detail: String },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Coarse classification used for log levels and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidAction,
    InvalidParameter,
    MissingPeerImage,
    DimensionMismatch,
    Storage,
    Queue,
    Lookup,
    Transport,
    Internal,
}

impl ErrorKind {
    /// Whether the failure was caused by what the user sent.
    pub fn is_user_error(self) -> bool {
        matches!(
            self,
            Self::InvalidAction
                | Self::InvalidParameter
                | Self::MissingPeerImage
                | Self::DimensionMismatch
        )
    }
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn storage(detail: impl Into<String>) -> Self {
        Self::Storage {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn queue(detail: impl Into<String>) -> Self {
        Self::Queue {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn lookup(detail: impl Into<String>) -> Self {
        Self::Lookup {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn transport<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAction | Self::InvalidAction { .. } | Self::EmptyMessage => {
                ErrorKind::InvalidAction
            },
            Self::InvalidDegree { .. } => ErrorKind::InvalidParameter,
            Self::MissingPeerImage => ErrorKind::MissingPeerImage,
            Self::Media(e) => match e {
                pixbot_media::Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
                pixbot_media::Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
                _ => ErrorKind::Internal,
            },
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Queue { .. } => ErrorKind::Queue,
            Self::Lookup { .. } | Self::Prediction { .. } => ErrorKind::Lookup,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Message(_) | Self::Io(_) | Self::SerdeJson(_) => ErrorKind::Internal,
        }
    }

    /// Text sent back to the chat that triggered the failure.
    pub fn user_message(&self) -> String {
        format!("An error has occurred:\n{self}\nPlease try again.")
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pixbot_common::impl_context!();
