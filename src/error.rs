use std::io;

/// Error type for the method store builder.
///
/// The per-record variants (`UnmappableChar`, `Unclassifiable`,
/// `TitleTooLong`, `NotationTooLong`) are recovered at the batch level;
/// `InvariantViolation` aborts the whole build.
#[derive(Debug, thiserror::Error)]
pub enum CcmlError {
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Invalid Format: {0}")]
    InvalidFormat(String),
    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
    #[error("Unmappable Character: {0}")]
    UnmappableChar(String),
    #[error("Unclassifiable Title: {0}")]
    Unclassifiable(String),
    #[error("Title Too Long: {0}")]
    TitleTooLong(String),
    #[error("Notation Too Long: {0}")]
    NotationTooLong(String),
    #[error("Invariant Violation: {0}")]
    InvariantViolation(String),
}

impl CcmlError {
    /// Whether this failure only rejects one record, leaving the rest of
    /// the batch to continue.
    pub fn is_record_fatal(&self) -> bool {
        matches!(
            self,
            CcmlError::UnmappableChar(_)
                | CcmlError::Unclassifiable(_)
                | CcmlError::TitleTooLong(_)
                | CcmlError::NotationTooLong(_)
        )
    }
}

impl From<io::Error> for CcmlError {
    fn from(e: io::Error) -> Self {
        CcmlError::Io(e.to_string())
    }
}

impl From<binrw::Error> for CcmlError {
    fn from(e: binrw::Error) -> Self {
        CcmlError::InvalidFormat(e.to_string())
    }
}

impl From<String> for CcmlError {
    fn from(s: String) -> Self {
        CcmlError::InvalidFormat(s)
    }
}

pub type Result<T> = std::result::Result<T, CcmlError>;
