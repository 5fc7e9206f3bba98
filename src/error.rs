//! Error types for the sheetsource library

use thiserror::Error;

/// Result type alias for sheetsource operations
pub type Result<T> = std::result::Result<T, SheetError>;

/// Main error type for all extraction operations
#[derive(Error, Debug)]
pub enum SheetError {
    /// IO error while reading the container or one of its entries
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Container is not a readable zip archive, or an entry is corrupt
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An XML part is not well-formed
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Character data in an XML part is not valid UTF-8
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The container holds no worksheet parts at all
    #[error("No worksheet parts found in container")]
    NoWorksheets,

    /// A cell referenced a shared string past the end of the table
    #[error("Shared string index {index} out of range (table holds {len} entries)")]
    SharedStringIndex { index: usize, len: usize },

    /// A cell marked as a shared-string reference did not hold a numeric index
    #[error("Invalid shared string reference: '{raw}'")]
    BadSharedStringRef { raw: String },

    /// A record sink refused a (column, value) pair
    #[error("Record sink rejected column '{column}': {message}")]
    Sink { column: String, message: String },
}

impl SheetError {
    /// Convenience constructor for sink implementations.
    pub fn sink(column: impl Into<String>, message: impl Into<String>) -> Self {
        SheetError::Sink {
            column: column.into(),
            message: message.into(),
        }
    }
}
