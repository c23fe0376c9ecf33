use thiserror::Error;

use breakwater_policy::codec::CodecError;

/// Failure talking to the shared remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the request outright.
    #[error("remote store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A record could not be moved to or from its wire form.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Shorthand for [`StoreError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the error category.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StoreError::Codec(_) => "STORE_CODEC",
        }
    }
}
