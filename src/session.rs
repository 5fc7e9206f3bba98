//! Extraction sessions over XLSX containers
//!
//! A [`SheetSource`] owns one container for the duration of an extraction.
//! Construction scans the container's entries exactly once, classifies them
//! by name, parses the shared-string part, and remembers the worksheet parts
//! in container enumeration order. Only then can an export run: the
//! shared-string table is always sealed before the first worksheet event is
//! walked, regardless of where the parts sit in the archive.
//!
//! Two input shapes are supported:
//! - [`SheetSource::open`] for a filesystem path (random-access archive)
//! - [`SheetSource::from_reader`] / [`SheetSource::from_bytes`] for
//!   forward-only entry streams such as embedded resources; worksheet part
//!   bytes are buffered during the single pass so phase ordering holds even
//!   when the shared-string part is enumerated last.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Result, SheetError};
use crate::shared_strings::SharedStrings;
use crate::translations::{LngKey, TranslationMap, TranslationRow};
use crate::unquote::Unquoter;
use crate::walker::{RecordSink, Selection, SheetWalker};

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_DIR: &str = "xl/worksheets/";
const WORKSHEET_EXT: &str = ".xml";

/// How a container entry participates in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    SharedStrings,
    Worksheet,
    Ignored,
}

fn classify(name: &str) -> EntryKind {
    if name == SHARED_STRINGS_PART {
        return EntryKind::SharedStrings;
    }
    let stem = name
        .strip_prefix(WORKSHEET_DIR)
        .and_then(|rest| rest.strip_suffix(WORKSHEET_EXT));
    match stem {
        Some(stem) if !stem.is_empty() && !stem.contains('/') => EntryKind::Worksheet,
        _ => EntryKind::Ignored,
    }
}

#[derive(Debug)]
enum Backing {
    /// Random-access archive; worksheet parts are re-read lazily by name.
    Archive {
        archive: ZipArchive<BufReader<File>>,
        worksheets: Vec<String>,
    },
    /// Forward-only stream; worksheet part bytes were buffered up front.
    Buffered { worksheets: Vec<BufferedPart> },
}

#[derive(Debug)]
struct BufferedPart {
    name: String,
    data: Vec<u8>,
}

/// Extraction session over one spreadsheet container.
///
/// # Example
///
/// ```no_run
/// use sheetsource::{SheetSource, TranslationMap};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut source = SheetSource::open("translations.xlsx")?;
///
/// let mut map = TranslationMap::new();
/// source.export_translations(&mut map)?;
///
/// for (key, phrase) in &map {
///     println!("{}/{} -> {}", key.language(), key.phrase(), phrase);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SheetSource {
    shared: SharedStrings,
    backing: Backing,
}

impl SheetSource {
    /// Open a container from a filesystem path.
    ///
    /// Entries are classified in container enumeration order; the
    /// shared-string part is parsed immediately, worksheet parts are walked
    /// later, per export. Fails with [`SheetError::NoWorksheets`] when the
    /// archive holds no worksheet part at all.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        let mut archive = ZipArchive::new(file)?;

        let mut has_shared = false;
        let mut worksheets = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            match classify(entry.name()) {
                EntryKind::SharedStrings => has_shared = true,
                EntryKind::Worksheet => worksheets.push(entry.name().to_string()),
                EntryKind::Ignored => {}
            }
        }
        if worksheets.is_empty() {
            return Err(SheetError::NoWorksheets);
        }

        let shared = if has_shared {
            let entry = archive.by_name(SHARED_STRINGS_PART)?;
            SharedStrings::parse(BufReader::new(entry))?
        } else {
            SharedStrings::new()
        };

        Ok(SheetSource {
            shared,
            backing: Backing::Archive { archive, worksheets },
        })
    }

    /// Open a container from a forward-only byte stream.
    ///
    /// The stream is consumed in a single pass. Worksheet part bytes are
    /// buffered so that the shared-string table is complete before any
    /// worksheet is walked, even when `xl/sharedStrings.xml` is enumerated
    /// after some worksheet parts.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut shared: Option<SharedStrings> = None;
        let mut worksheets = Vec::new();

        while let Some(mut entry) = zip::read::read_zipfile_from_stream(&mut reader)? {
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            match classify(&name) {
                EntryKind::SharedStrings => {
                    shared = Some(SharedStrings::parse(BufReader::new(&mut entry))?);
                }
                EntryKind::Worksheet => {
                    let mut data = Vec::new();
                    entry.read_to_end(&mut data)?;
                    worksheets.push(BufferedPart { name, data });
                }
                EntryKind::Ignored => {}
            }
        }
        if worksheets.is_empty() {
            return Err(SheetError::NoWorksheets);
        }

        Ok(SheetSource {
            shared: shared.unwrap_or_default(),
            backing: Backing::Buffered { worksheets },
        })
    }

    /// Open a container held in memory, e.g. an embedded resource.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(bytes)
    }

    /// The sealed shared-string table.
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared
    }

    /// Number of worksheet parts found during classification.
    pub fn worksheet_count(&self) -> usize {
        match &self.backing {
            Backing::Archive { worksheets, .. } => worksheets.len(),
            Backing::Buffered { worksheets } => worksheets.len(),
        }
    }

    /// Names of the worksheet parts, in container enumeration order.
    pub fn worksheet_names(&self) -> Vec<&str> {
        match &self.backing {
            Backing::Archive { worksheets, .. } => {
                worksheets.iter().map(String::as_str).collect()
            }
            Backing::Buffered { worksheets } => {
                worksheets.iter().map(|part| part.name.as_str()).collect()
            }
        }
    }

    /// Walk every worksheet part, emitting one record per accepted row.
    ///
    /// This is the generic export underneath the mapping and delimited-text
    /// modes: `factory` produces a fresh accumulator per accepted row,
    /// `consumer` receives each finished accumulator, `transform` runs over
    /// every resolved cell value. Worksheet parts are walked strictly
    /// sequentially, in container enumeration order, through one walker so
    /// the worksheet selector sees part indices.
    pub fn export_records<T, F, C, X>(
        &mut self,
        selection: &Selection<'_>,
        factory: F,
        consumer: C,
        transform: X,
    ) -> Result<()>
    where
        T: RecordSink,
        F: FnMut() -> T,
        C: FnMut(T) -> Result<()>,
        X: Fn(String) -> String,
    {
        let SheetSource { shared, backing } = self;
        let mut walker = SheetWalker::new(shared, selection, factory, consumer, transform);
        match backing {
            Backing::Archive { archive, worksheets } => {
                for name in worksheets.iter() {
                    let entry = archive.by_name(name)?;
                    walker.walk(BufReader::new(entry))?;
                }
            }
            Backing::Buffered { worksheets } => {
                for part in worksheets.iter() {
                    walker.walk(part.data.as_slice())?;
                }
            }
        }
        Ok(())
    }

    /// Extract (language, phrase) -> translation triples into `map`.
    ///
    /// Every worksheet is expected to carry three columns per row: the
    /// language code, the key phrase and the translated phrase. Rows with
    /// fewer than three cells are skipped. Duplicate keys overwrite, last
    /// write wins in container/document order.
    pub fn export_translations(&mut self, map: &mut TranslationMap) -> Result<()> {
        self.export_translations_with(map, |value| value)
    }

    /// Like [`export_translations`](Self::export_translations), passing every
    /// cell value through `transform` first.
    ///
    /// [`unquote`](crate::unquote::unquote) is the usual transformer for
    /// workbooks whose cells kept CSV-style quoting.
    pub fn export_translations_with<X>(
        &mut self,
        map: &mut TranslationMap,
        transform: X,
    ) -> Result<()>
    where
        X: Fn(String) -> String,
    {
        let selection = Selection::all().columns(|i| i < 3);
        self.export_records(
            &selection,
            TranslationRow::default,
            |row: TranslationRow| {
                match row.into_triple() {
                    Some((language, phrase, translation)) => {
                        map.insert(LngKey::new(language, phrase), translation);
                    }
                    None => log::debug!("skipping row with fewer than three cells"),
                }
                Ok(())
            },
            transform,
        )
    }

    /// Write every accepted row as delimited text.
    ///
    /// Cell values are passed through the quote-normalizing transform, then
    /// joined with `column_delimiter`; rows are joined with `row_delimiter`.
    /// No trailing delimiter is emitted after the final row, and the row
    /// delimiter also separates the last row of one worksheet from the first
    /// row of the next.
    pub fn export_delimited<W: Write>(
        &mut self,
        mut out: W,
        column_delimiter: &str,
        row_delimiter: &str,
    ) -> Result<()> {
        let mut filter = Unquoter::new();
        let mut scratch = String::new();
        let mut first_row = true;

        self.export_records(
            &Selection::all(),
            DelimitedRow::default,
            |row: DelimitedRow| {
                if !first_row {
                    out.write_all(row_delimiter.as_bytes())?;
                }
                first_row = false;
                for (i, value) in row.cells.iter().enumerate() {
                    if i > 0 {
                        out.write_all(column_delimiter.as_bytes())?;
                    }
                    scratch.clear();
                    filter.reset();
                    filter.feed(value, &mut scratch);
                    out.write_all(scratch.as_bytes())?;
                }
                Ok(())
            },
            |value| value,
        )?;
        out.flush()?;
        Ok(())
    }
}

/// Accumulator for delimited-text export: cell values in column order.
#[derive(Debug, Default)]
struct DelimitedRow {
    cells: Vec<String>,
}

impl RecordSink for DelimitedRow {
    fn set(&mut self, _column: &str, value: String) -> Result<()> {
        self.cells.push(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;

    const SST: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3"><si><t>en</t></si><si><t>greeting</t></si><si><t>Hello</t></si></sst>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
</sheetData></worksheet>"#;

    fn container(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_classify_entry_names() {
        assert_eq!(classify("xl/sharedStrings.xml"), EntryKind::SharedStrings);
        assert_eq!(classify("xl/worksheets/sheet1.xml"), EntryKind::Worksheet);
        assert_eq!(classify("xl/worksheets/data.xml"), EntryKind::Worksheet);
        assert_eq!(classify("xl/workbook.xml"), EntryKind::Ignored);
        assert_eq!(
            classify("xl/worksheets/_rels/sheet1.xml.rels"),
            EntryKind::Ignored
        );
        assert_eq!(classify("xl/worksheets/.xml"), EntryKind::Ignored);
        assert_eq!(classify("xl/worksheets/nested/sheet.xml"), EntryKind::Ignored);
        // Classification is case-sensitive.
        assert_eq!(classify("xl/SharedStrings.xml"), EntryKind::Ignored);
    }

    #[test]
    fn test_zero_worksheets_is_a_configuration_error() {
        let bytes = container(&[("xl/sharedStrings.xml", SST), ("xl/workbook.xml", "<x/>")]);
        let err = SheetSource::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, SheetError::NoWorksheets));
    }

    #[test]
    fn test_shared_strings_sealed_before_any_walk() {
        // Worksheet enumerated before the shared-string part; indirected
        // cells must still resolve.
        let bytes = container(&[
            ("xl/worksheets/sheet1.xml", SHEET),
            ("xl/sharedStrings.xml", SST),
        ]);
        let mut source = SheetSource::from_bytes(&bytes).unwrap();
        assert_eq!(source.shared_strings().len(), 3);

        let mut map = TranslationMap::new();
        source.export_translations(&mut map).unwrap();
        assert_eq!(
            map.get(&LngKey::new("en", "greeting")).map(String::as_str),
            Some("Hello")
        );
    }

    #[test]
    fn test_worksheet_names_keep_container_order() {
        let bytes = container(&[
            ("xl/worksheets/zeta.xml", SHEET),
            ("xl/sharedStrings.xml", SST),
            ("xl/worksheets/alpha.xml", SHEET),
        ]);
        let source = SheetSource::from_bytes(&bytes).unwrap();
        // Enumeration order, not filename order.
        assert_eq!(
            source.worksheet_names(),
            vec!["xl/worksheets/zeta.xml", "xl/worksheets/alpha.xml"]
        );
    }
}
