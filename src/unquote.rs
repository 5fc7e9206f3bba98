//! Doubled-quote normalization for CSV-origin values
//!
//! Spreadsheet cells that were pasted from CSV often carry the delimited-text
//! escaping convention: a field is wrapped in quote characters, and a literal
//! quote inside the field is written as two consecutive quotes. This module
//! removes that layer again, as a streaming filter:
//!
//! - `"x,y"` becomes `x,y`
//! - `"a""b"` becomes `a"b`
//! - `""` becomes the empty string
//!
//! The filter keeps two bits of state and never buffers more than a fixed
//! staging block, so it can run over values of any length.

use std::io::{self, Write};

const QUOTE: char = '"';

/// Size of the staging block used by [`UnquotingWriter`]
const STAGE_LEN: usize = 512;

/// Streaming filter that strips the doubled-quote escaping convention.
///
/// The state toggles on every quote character seen. A quote that closes a
/// quoted run arms a pending flag; if the very next character re-opens a
/// quoted run, that pair was an escaped literal quote and a single quote is
/// emitted. Any other character clears the flag.
///
/// The same instance can be reused across independent strings by calling
/// [`reset`](Unquoter::reset) between them.
///
/// # Example
///
/// ```
/// use sheetsource::unquote::Unquoter;
///
/// let mut filter = Unquoter::new();
/// let mut out = String::new();
/// filter.feed("\"a\"\"b\"", &mut out);
/// assert_eq!(out, "a\"b");
/// assert!(!filter.is_quoted());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Unquoter {
    quoted: bool,
    pending_quote: bool,
}

impl Unquoter {
    /// Create a filter in the unquoted state.
    pub fn new() -> Self {
        Unquoter::default()
    }

    /// Process one character, returning the character to emit, if any.
    pub fn step(&mut self, c: char) -> Option<char> {
        if c == QUOTE {
            if self.on_quote() {
                Some(QUOTE)
            } else {
                None
            }
        } else {
            self.pending_quote = false;
            Some(c)
        }
    }

    /// Process one byte. UTF-8 safe: the quote character is a single byte
    /// and never occurs inside a multi-byte sequence.
    pub fn step_byte(&mut self, b: u8) -> Option<u8> {
        if b == QUOTE as u8 {
            if self.on_quote() {
                Some(QUOTE as u8)
            } else {
                None
            }
        } else {
            self.pending_quote = false;
            Some(b)
        }
    }

    /// Run the filter over `input`, appending emitted characters to `out`.
    pub fn feed(&mut self, input: &str, out: &mut String) {
        for c in input.chars() {
            if let Some(c) = self.step(c) {
                out.push(c);
            }
        }
    }

    /// Clear all state so the filter can be reused for an unrelated string.
    pub fn reset(&mut self) {
        self.quoted = false;
        self.pending_quote = false;
    }

    /// Whether the filter is currently inside a quoted run.
    ///
    /// After a complete value this returns `true` exactly when the input held
    /// an odd number of quote characters (unterminated quoting).
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    // Shared transition for the quote character; returns whether to emit a
    // literal quote.
    fn on_quote(&mut self) -> bool {
        self.quoted = !self.quoted;
        if self.quoted {
            if self.pending_quote {
                self.pending_quote = false;
                return true;
            }
        } else {
            self.pending_quote = true;
        }
        false
    }
}

/// Remove doubled-quote escaping from a whole string.
///
/// # Example
///
/// ```
/// use sheetsource::unquote::unquote;
///
/// assert_eq!(unquote("\"x,y\""), "x,y");
/// assert_eq!(unquote("plain"), "plain");
/// ```
pub fn unquote(input: &str) -> String {
    let mut filter = Unquoter::new();
    let mut out = String::with_capacity(input.len());
    filter.feed(input, &mut out);
    out
}

/// [`Write`] adapter that unquotes everything passing through it.
///
/// Bytes are filtered through the same state machine as [`Unquoter`] and
/// staged in a fixed block before reaching the inner writer, so arbitrarily
/// large writes stay bounded. State survives across `write` calls, which
/// makes the adapter suitable for values arriving in chunks.
pub struct UnquotingWriter<W: Write> {
    inner: W,
    filter: Unquoter,
}

impl<W: Write> UnquotingWriter<W> {
    /// Wrap a writer in the unquoting filter.
    pub fn new(inner: W) -> Self {
        UnquotingWriter {
            inner,
            filter: Unquoter::new(),
        }
    }

    /// Clear the filter state without touching the inner writer.
    pub fn reset(&mut self) {
        self.filter.reset();
    }

    /// Whether the stream is currently inside a quoted run.
    pub fn is_quoted(&self) -> bool {
        self.filter.is_quoted()
    }

    /// Unwrap, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for UnquotingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut stage = [0u8; STAGE_LEN];
        let mut staged = 0;
        for &b in buf {
            if let Some(out) = self.filter.step_byte(b) {
                stage[staged] = out;
                staged += 1;
                if staged == STAGE_LEN {
                    self.inner.write_all(&stage)?;
                    staged = 0;
                }
            }
        }
        self.inner.write_all(&stage[..staged])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
