//! The one row dialect export files use.
//!
//! Tab delimited, `"` quoting with doubled quotes as the escape. Rows may end
//! in `\n`, `\r\n` or `\r` on read; they are always written with `\r\n`.
//! Quotes are only added when a field needs them.

use std::io::{self, Read, Write};

pub const DELIMITER:  u8 = b'\t';
pub const QUOTE:      u8 = b'"';

/// Row reader over the remainder of an export stream.
///
/// Rows are allowed to differ in length; naming copes with that per row.
pub fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_reader(rdr)
}

pub fn writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(wtr)
}

/// Like [`writer`] but quotes every field.
///
/// Used for a first row whose leading field starts with the header marker,
/// which would otherwise read back as a header line.
pub fn quoting_writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(wtr)
}

/// Anything that accepts one ordered row of fields per call.
///
/// The sink owns the delimiter and quoting policy; callers only hand over
/// values.
pub trait RowSink {
    fn write_row(&mut self, row: &[&str]) -> io::Result<()>;
}

impl<W: Write> RowSink for csv::Writer<W> {
    fn write_row(&mut self, row: &[&str]) -> io::Result<()> {
        self.write_record(row).map_err(io::Error::from)
    }
}

/// Collects rows in memory. Handy when the caller wants the values, not text.
impl RowSink for Vec<Vec<String>> {
    fn write_row(&mut self, row: &[&str]) -> io::Result<()> {
        self.push(row.iter().map(|s| (*s).to_owned()).collect());
        Ok(())
    }
}
