//! Error types for the attendance core.
//!
//! Every variant is recoverable by the user: the message is meant to be shown
//! as-is, and no failing operation leaves a partial write behind.

use crate::export::SignatureKind;
use crate::store::StoreKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error(
        "CSV must contain columns for student name and student ID. \
         Expected columns like \"name\", \"student name\", \"id\", \"student id\""
    )]
    MissingColumns,

    /// 1-based data row number.
    #[error("Row {0} is missing name or ID")]
    InvalidRow(usize),

    #[error("No valid student records found in CSV")]
    EmptyRoster,

    #[error("Error parsing CSV: {0}")]
    ParseFailure(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignInError {
    #[error("student has already signed in this session")]
    DuplicateSignIn,

    #[error("student name and ID are required")]
    MissingFields,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignOutError {
    #[error("student is not currently signed in")]
    NotSignedIn,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored {key} value is unreadable: {message}")]
    Corrupt { key: StoreKey, message: String },

    #[error("failed to clear {}", join_keys(.0))]
    PartialFailure(Vec<StoreKey>),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

fn join_keys(keys: &[StoreKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("{kind} signature for student {id} is not a valid image")]
    InvalidSignature { id: String, kind: SignatureKind },

    #[error("failed to build archive: {0}")]
    Archive(String),
}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::Archive(e.to_string())
    }
}

/// Anything a session operation can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    SignIn(#[from] SignInError),

    #[error(transparent)]
    SignOut(#[from] SignOutError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
