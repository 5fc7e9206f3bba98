//! Selective worksheet walking
//!
//! The walker is the extraction engine: it consumes one worksheet part's XML
//! event stream, tracks its position with a [`PathCursor`], and rebuilds rows
//! and cells from the `worksheet / sheetData / row / c / v` nesting. Caller
//! supplied selector predicates decide which worksheets, rows and columns
//! participate; every accepted row is assembled into a fresh accumulator and
//! handed to the caller's consumer exactly once, at row close.
//!
//! Cursor tracking is unconditional. A deselected worksheet or row is still
//! walked event by event so counters and positions stay exact, it just emits
//! nothing.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, SheetError};
use crate::path_cursor::PathCursor;
use crate::shared_strings::SharedStrings;

const WORKSHEET_PATH: &[&str] = &["worksheet"];
const ROW_PATH: &[&str] = &["worksheet", "sheetData", "row"];
const CELL_PATH: &[&str] = &["worksheet", "sheetData", "row", "c"];
const VALUE_PATH: &[&str] = &["worksheet", "sheetData", "row", "c", "v"];

/// Capability to receive one resolved cell.
///
/// Implementors are accumulators: one fresh instance is produced per accepted
/// row and populated with (column label, value) pairs in column order. The
/// column label is the spreadsheet-style letter part of the cell reference
/// ("A", "B", "AA").
pub trait RecordSink {
    /// Store `value` under the given column label.
    fn set(&mut self, column: &str, value: String) -> Result<()>;
}

/// Selection predicates for the three walk levels.
///
/// Each predicate is a pure function of a zero-based index: worksheet indices
/// count worksheet parts across the whole session, row indices reset per
/// worksheet, column indices reset per row. Every index is passed to its
/// predicate exactly once, in document order.
///
/// # Example
///
/// ```
/// use sheetsource::walker::Selection;
///
/// // First worksheet only, skip the header row, first three columns.
/// let selection = Selection::all()
///     .worksheets(|i| i == 0)
///     .rows(|i| i > 0)
///     .columns(|i| i < 3);
/// # let _ = selection;
/// ```
pub struct Selection<'a> {
    worksheets: Box<dyn Fn(usize) -> bool + 'a>,
    rows: Box<dyn Fn(usize) -> bool + 'a>,
    columns: Box<dyn Fn(usize) -> bool + 'a>,
}

impl Default for Selection<'_> {
    fn default() -> Self {
        Selection::all()
    }
}

impl<'a> Selection<'a> {
    /// Select every worksheet, row and column.
    pub fn all() -> Self {
        Selection {
            worksheets: Box::new(|_| true),
            rows: Box::new(|_| true),
            columns: Box::new(|_| true),
        }
    }

    /// Replace the worksheet predicate.
    pub fn worksheets(mut self, predicate: impl Fn(usize) -> bool + 'a) -> Self {
        self.worksheets = Box::new(predicate);
        self
    }

    /// Replace the row predicate.
    pub fn rows(mut self, predicate: impl Fn(usize) -> bool + 'a) -> Self {
        self.rows = Box::new(predicate);
        self
    }

    /// Replace the column predicate.
    pub fn columns(mut self, predicate: impl Fn(usize) -> bool + 'a) -> Self {
        self.columns = Box::new(predicate);
        self
    }
}

/// Streaming walker over worksheet parts.
///
/// One walker is driven across all worksheet parts of a session so the
/// worksheet index keeps counting in container order; row and column state
/// resets at the boundaries described on [`Selection`]. The walker borrows
/// the session's sealed [`SharedStrings`] table to resolve indirected cells.
///
/// Memory use is bounded by the deepest element nesting plus one cell's
/// text, independent of document size.
pub struct SheetWalker<'a, T, F, C, X> {
    shared: &'a SharedStrings,
    selection: &'a Selection<'a>,
    factory: F,
    consumer: C,
    transform: X,

    cursor: PathCursor,
    worksheet_index: usize,
    row_index: usize,
    column_index: usize,
    worksheet_selected: bool,
    row_selected: bool,
    column_selected: bool,
    row_ref: String,
    column_label: String,
    shared_ref: bool,
    cell_buf: String,
    record: Option<T>,
}

impl<'a, T, F, C, X> SheetWalker<'a, T, F, C, X>
where
    T: RecordSink,
    F: FnMut() -> T,
    C: FnMut(T) -> Result<()>,
    X: Fn(String) -> String,
{
    /// Create a walker over the given shared-string table and selection.
    ///
    /// `factory` produces one fresh accumulator per accepted row, `consumer`
    /// receives each finished accumulator, and `transform` is applied to
    /// every resolved cell value before it reaches the accumulator.
    pub fn new(
        shared: &'a SharedStrings,
        selection: &'a Selection<'a>,
        factory: F,
        consumer: C,
        transform: X,
    ) -> Self {
        SheetWalker {
            shared,
            selection,
            factory,
            consumer,
            transform,
            cursor: PathCursor::new(),
            worksheet_index: 0,
            row_index: 0,
            column_index: 0,
            worksheet_selected: false,
            row_selected: false,
            column_selected: false,
            row_ref: String::new(),
            column_label: String::new(),
            shared_ref: false,
            cell_buf: String::new(),
            record: None,
        }
    }

    /// Walk one worksheet part to completion.
    ///
    /// May be called once per part; the worksheet counter carries over so
    /// selector indices stay aligned with container order.
    pub fn walk<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let mut xml = Reader::from_reader(reader);
        let mut buf = Vec::new();

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(e) => self.open_element(&e)?,
                Event::Empty(e) => {
                    self.open_element(&e)?;
                    self.close_element()?;
                }
                Event::End(_) => self.close_element()?,
                Event::Text(e) => self.text(&e.unescape()?),
                Event::CData(e) => {
                    let chunk = std::str::from_utf8(e.as_ref())?.to_string();
                    self.text(&chunk);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn open_element(&mut self, e: &BytesStart<'_>) -> Result<()> {
        self.cursor
            .open(&String::from_utf8_lossy(e.local_name().as_ref()));

        if self.cursor.matches(WORKSHEET_PATH) {
            self.worksheet_selected = (self.selection.worksheets)(self.worksheet_index);
            self.worksheet_index += 1;
            self.row_index = 0;
        } else if self.worksheet_selected && self.cursor.matches(ROW_PATH) {
            self.row_selected = (self.selection.rows)(self.row_index);
            self.row_index += 1;
            self.column_index = 0;
            if self.row_selected {
                self.row_ref = attr(e, b"r")?.unwrap_or_default();
                self.record = Some((self.factory)());
            }
        } else if self.worksheet_selected && self.row_selected && self.cursor.matches(CELL_PATH) {
            self.column_selected = (self.selection.columns)(self.column_index);
            self.column_index += 1;
            self.cell_buf.clear();
            if self.column_selected {
                let cell_ref = attr(e, b"r")?.unwrap_or_default();
                self.column_label = column_label(&cell_ref, &self.row_ref);
                self.shared_ref = attr(e, b"t")?.as_deref() == Some("s");
            }
        }

        Ok(())
    }

    fn close_element(&mut self) -> Result<()> {
        if self.worksheet_selected && self.row_selected {
            if self.cursor.matches(CELL_PATH) {
                if self.column_selected {
                    let value = self.resolve_cell()?;
                    let value = (self.transform)(value);
                    if let Some(record) = self.record.as_mut() {
                        // Best-effort per cell: a sink that refuses one value
                        // does not abort the walk.
                        if let Err(err) = record.set(&self.column_label, value) {
                            log::warn!(
                                "record sink rejected column '{}': {}",
                                self.column_label,
                                err
                            );
                        }
                    }
                }
                self.cell_buf.clear();
            } else if self.cursor.matches(ROW_PATH) {
                if let Some(record) = self.record.take() {
                    (self.consumer)(record)?;
                }
            }
        }
        self.cursor.close();
        Ok(())
    }

    fn text(&mut self, chunk: &str) {
        if self.worksheet_selected
            && self.row_selected
            && self.column_selected
            && self.cursor.matches(VALUE_PATH)
        {
            self.cell_buf.push_str(chunk);
        }
    }

    fn resolve_cell(&self) -> Result<String> {
        if self.shared_ref {
            let raw = self.cell_buf.trim();
            let index: usize = raw.parse().map_err(|_| SheetError::BadSharedStringRef {
                raw: raw.to_string(),
            })?;
            Ok(self.shared.get(index)?.to_string())
        } else {
            Ok(self.cell_buf.clone())
        }
    }
}

/// Derive the column label ("A", "B", "AA") from a cell reference ("A1").
///
/// The row reference is the row-number suffix; when the cell reference does
/// not end with it (some producers omit the row's `r` attribute), trailing
/// digits are stripped instead.
fn column_label(cell_ref: &str, row_ref: &str) -> String {
    if !row_ref.is_empty() {
        if let Some(label) = cell_ref.strip_suffix(row_ref) {
            return label.to_string();
        }
    }
    cell_ref
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string()
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
