//! Shared-string table loading
//!
//! XLSX containers deduplicate cell text into `xl/sharedStrings.xml`; cells
//! then reference entries by zero-based position. The table must be loaded
//! fully before any worksheet referencing it is walked, because worksheet
//! parts carry only the integer indices.
//!
//! The table is built in a single pass over the XML event stream and is
//! immutable afterwards.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, SheetError};
use crate::path_cursor::PathCursor;

const ENTRY_PATH: &[&str] = &["sst", "si"];
const ENTRY_TEXT_PATH: &[&str] = &["sst", "si", "t"];
const RICH_RUN_TEXT_PATH: &[&str] = &["sst", "si", "r", "t"];

/// Ordered, append-only string table indexed by declaration order.
///
/// One entry is produced per `<si>` element, in document order. Rich-text
/// entries (multiple `<r><t>` runs) are flattened by concatenating their
/// text runs; phonetic runs are not part of the displayed string and are
/// skipped.
#[derive(Debug, Default, Clone)]
pub struct SharedStrings {
    entries: Vec<String>,
}

impl SharedStrings {
    /// Create an empty table, for containers without a shared-strings part.
    pub fn new() -> Self {
        SharedStrings::default()
    }

    /// Build the table from the shared-strings part's XML.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut xml = Reader::from_reader(reader);
        let mut cursor = PathCursor::new();
        let mut entries = Vec::new();
        let mut entry = String::new();
        let mut buf = Vec::new();

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    cursor.open(&String::from_utf8_lossy(e.local_name().as_ref()));
                }
                Event::Empty(e) => {
                    cursor.open(&String::from_utf8_lossy(e.local_name().as_ref()));
                    Self::close_element(&mut cursor, &mut entries, &mut entry);
                }
                Event::End(_) => {
                    Self::close_element(&mut cursor, &mut entries, &mut entry);
                }
                Event::Text(e) => {
                    if cursor.matches(ENTRY_TEXT_PATH) || cursor.matches(RICH_RUN_TEXT_PATH) {
                        entry.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if cursor.matches(ENTRY_TEXT_PATH) || cursor.matches(RICH_RUN_TEXT_PATH) {
                        entry.push_str(std::str::from_utf8(e.as_ref())?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(SharedStrings { entries })
    }

    fn close_element(cursor: &mut PathCursor, entries: &mut Vec<String>, entry: &mut String) {
        if cursor.matches(ENTRY_PATH) {
            entries.push(std::mem::take(entry));
        }
        cursor.close();
    }

    /// Look up an entry by its declaration-order index.
    ///
    /// An index at or past the end of the table is a data error in the
    /// referencing worksheet, never silently clamped.
    pub fn get(&self, index: usize) -> Result<&str> {
        self.entries
            .get(index)
            .map(String::as_str)
            .ok_or(SheetError::SharedStringIndex {
                index,
                len: self.entries.len(),
            })
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
