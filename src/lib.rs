//! # sheetsource
//!
//! A Rust library for streaming extraction of tabular data from XLSX
//! containers, without materializing the document model in memory.
//!
//! ## Features
//!
//! - **Streaming Extraction**: Worksheets are walked as XML event streams;
//!   memory stays bounded regardless of archive size
//! - **Selector-Driven**: Caller-supplied predicates pick worksheets, rows
//!   and columns by zero-based index
//! - **Generic Records**: Any type with a "set field by column label"
//!   capability can receive rows, one fresh accumulator per accepted row
//! - **Shared Strings Resolved**: The shared-string table is loaded once and
//!   sealed before any worksheet referencing it is walked
//! - **Two Output Modes**: An ordered translation map with case-insensitive
//!   (language, phrase) keys, or delimited text with quote normalization
//!
//! ## Quick Start
//!
//! ### Extracting a translation map
//!
//! ```rust,no_run
//! use sheetsource::{SheetSource, TranslationMap};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = SheetSource::open("translations.xlsx")?;
//!
//! let mut map = TranslationMap::new();
//! source.export_translations(&mut map)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Writing delimited text
//!
//! ```rust,no_run
//! use sheetsource::SheetSource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = SheetSource::open("translations.xlsx")?;
//!
//! let mut csv = Vec::new();
//! source.export_delimited(&mut csv, ",", "\n")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Custom records and selection
//!
//! ```rust,no_run
//! use sheetsource::{Result, RecordSink, Selection, SheetSource};
//!
//! #[derive(Default)]
//! struct Contact {
//!     email: String,
//! }
//!
//! impl RecordSink for Contact {
//!     fn set(&mut self, column: &str, value: String) -> Result<()> {
//!         if column == "B" {
//!             self.email = value;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut source = SheetSource::open("accounts.xlsx")?;
//! let selection = Selection::all()
//!     .worksheets(|i| i == 0)
//!     .rows(|i| i > 0); // skip the header row
//!
//! let mut contacts = Vec::new();
//! source.export_records(
//!     &selection,
//!     Contact::default,
//!     |contact| {
//!         contacts.push(contact);
//!         Ok(())
//!     },
//!     |value| value,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod path_cursor;
pub mod session;
pub mod shared_strings;
pub mod translations;
pub mod unquote;
pub mod walker;

pub use error::{Result, SheetError};
pub use path_cursor::PathCursor;
pub use session::SheetSource;
pub use shared_strings::SharedStrings;
pub use translations::{LngKey, TranslationMap};
pub use unquote::{unquote, Unquoter, UnquotingWriter};
pub use walker::{RecordSink, Selection, SheetWalker};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<SheetError>;
        let _ = std::marker::PhantomData::<SheetSource>;
        let _ = std::marker::PhantomData::<SharedStrings>;
        let _ = std::marker::PhantomData::<LngKey>;
    }
}
