use std::io;
use thiserror::Error;

/// Every failure the shell can produce.
///
/// The `Display` text of the recoverable variants is the exact diagnostic
/// line printed to the user, so the REPL can render any of them with a bare
/// `println!("{e}")`.
#[derive(Error, Debug)]
pub enum KardexError {
    #[error("** class name missing **")]
    ClassNameMissing,
    #[error("** class doesn't exist **")]
    ClassDoesntExist,
    #[error("** instance id missing **")]
    InstanceIdMissing,
    #[error("** attribute name missing **")]
    AttributeNameMissing,
    #[error("** value missing **")]
    ValueMissing,
    #[error("** no instance found **")]
    NoInstanceFound,
    #[error("*** Unknown syntax: {0}")]
    UnknownSyntax(String),
    /// A stored entity no longer agrees with the key it is filed under.
    /// Saving would persist the corruption, so the save aborts instead.
    #[error("store key '{key}' does not match entity '{class_name}.{id}'")]
    KeyMismatch {
        key: String,
        class_name: String,
        id: String,
    },
    /// The persisted document names a class this build does not know.
    #[error("unknown class tag '{0}' in storage document")]
    UnknownClassTag(String),
    #[error("invalid timestamp '{value}' for '{field}': {source}")]
    Timestamp {
        field: String,
        value: String,
        source: chrono::ParseError,
    },
    /// The persisted document could not be parsed on reload.
    #[error("malformed storage document: {0}")]
    Document(serde_json::Error),
    /// The in-memory map could not be rendered as JSON on save.
    #[error("could not serialize store: {0}")]
    Serialize(serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl KardexError {
    /// Recoverable errors are printed and the REPL keeps going; fatal ones
    /// mean the store can no longer be trusted and must stop the process.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            KardexError::ClassNameMissing
                | KardexError::ClassDoesntExist
                | KardexError::InstanceIdMissing
                | KardexError::AttributeNameMissing
                | KardexError::ValueMissing
                | KardexError::NoInstanceFound
                | KardexError::UnknownSyntax(_)
        )
    }
}
