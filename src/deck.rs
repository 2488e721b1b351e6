//! A deck: header settings plus cards in file order.
//!
//! ```no_run
//! use gaggle::deck::Deck;
//!
//! let (deck, diagnostics) = Deck::from_path("notes.txt", &["Front", "Back"])?;
//! for card in &deck {
//!     println!("{}", card.get("Front")?);
//! }
//! for d in &diagnostics {
//!     eprintln!("warning: {d}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use thiserror::Error;

use crate::card::{Card, CardError};
use crate::diagnostics::{DiagnosticLog, DiagnosticSink};
use crate::field_names::NameResolutionContext;
use crate::header::{self, HeaderError, HeaderSettings, SettingKey, SettingValue, SEPARATOR_TAB};
use crate::tsv;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),
    #[error("Row {row}: {source}")]
    Card { row: usize, source: CardError },
    #[error("Row decode error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unsupported separator {0:?}, only \"tab\" can be decoded")]
    UnsupportedSeparator(SettingValue),
    #[error("Row {row} has {field_count} fields but the header declares column {column}")]
    ColumnOutOfRange { row: usize, column: usize, field_count: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    header: HeaderSettings,
    cards:  Vec<Card>,
}

impl Deck {
    pub fn new(header: HeaderSettings, cards: Vec<Card>) -> Self {
        Self { header, cards }
    }

    /// Open and parse an export file.
    pub fn from_path<P, S>(path: P, candidates: &[S]) -> Result<(Self, DiagnosticLog), DeckError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let mut log = DiagnosticLog::new();
        let deck = Self::from_path_with_sink(path, candidates, &mut log)?;
        Ok((deck, log))
    }

    /// Open and parse an export file, reporting diagnostics to `sink` as
    /// they are raised.
    pub fn from_path_with_sink<P, S>(
        path:       P,
        candidates: &[S],
        sink:       &mut dyn DiagnosticSink,
    ) -> Result<Self, DeckError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let file = File::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "reading deck");
        Self::from_reader_with_sink(BufReader::new(file), candidates, sink)
    }

    /// Parse an export stream, collecting diagnostics into a fresh log.
    ///
    /// On error the log is dropped; use [`Deck::from_reader_with_sink`] to
    /// keep diagnostics raised before the failing row.
    pub fn from_reader<R, S>(reader: R, candidates: &[S]) -> Result<(Self, DiagnosticLog), DeckError>
    where
        R: BufRead,
        S: AsRef<str>,
    {
        let mut log = DiagnosticLog::new();
        let deck = Self::from_reader_with_sink(reader, candidates, &mut log)?;
        Ok((deck, log))
    }

    /// Parse an export stream, reporting diagnostics to `sink`.
    ///
    /// `candidates` names the fields of every row. One naming context is
    /// built from the header and shared by all rows. Diagnostics reach
    /// `sink` as soon as they are raised, so a later fatal row keeps them.
    pub fn from_reader_with_sink<R, S>(
        mut reader: R,
        candidates: &[S],
        sink:       &mut dyn DiagnosticSink,
    ) -> Result<Self, DeckError>
    where
        R: BufRead,
        S: AsRef<str>,
    {
        let header = header::parse(&mut reader)?;
        match header.get(SettingKey::Separator) {
            None => {}
            Some(SettingValue::Text(s)) if s == SEPARATOR_TAB => {}
            Some(other) => return Err(DeckError::UnsupportedSeparator(other.clone())),
        }
        header.has_html()?;
        let ctx = NameResolutionContext::from_header(&header)?;
        let last_column = ctx.last_reserved_column();

        let mut cards = Vec::new();
        for (row, record) in tsv::reader(reader).records().enumerate() {
            let record = record?;
            if let Some(column) = last_column.filter(|c| *c >= record.len()) {
                return Err(DeckError::ColumnOutOfRange { row, column, field_count: record.len() });
            }
            let _span = tracing::debug_span!("row", index = row).entered();
            let values: Vec<&str> = record.iter().collect();
            let card = Card::from_fields(values, candidates, &ctx, sink)
                .map_err(|source| DeckError::Card { row, source })?;
            cards.push(card);
        }
        tracing::debug!(cards = cards.len(), settings = header.len(), "deck parsed");
        Ok(Self { header, cards })
    }

    pub fn header(&self) -> &HeaderSettings {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderSettings {
        &mut self.header
    }

    pub fn header_setting(&self, key: SettingKey) -> Option<&SettingValue> {
        self.header.get(key)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Add a card at the end. Its names are not checked against other cards.
    pub fn append(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Write the header, then one row per card in order.
    ///
    /// A first row starting with `#` is fully quoted so it is not read back
    /// as part of the header.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        header::write(&mut writer, &self.header)?;
        let mut cards = self.cards.iter().peekable();
        if let Some(first) = cards.next_if(|card| starts_with_header_marker(card)) {
            let mut quoted = tsv::quoting_writer(&mut writer);
            first.write_row(&mut quoted)?;
            quoted.flush()?;
        }
        let mut rows = tsv::writer(writer);
        for card in cards {
            card.write_row(&mut rows)?;
        }
        rows.flush()
    }
}

fn starts_with_header_marker(card: &Card) -> bool {
    card.iter()
        .next()
        .is_some_and(|(_, value)| value.as_bytes().first() == Some(&header::HEADER_LINE_MARKER))
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

impl IntoIterator for Deck {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use std::io::Cursor;

    const NO_NAMES: &[&str] = &[];

    fn parse(text: &str, names: &[&str]) -> Result<(Deck, DiagnosticLog), DeckError> {
        Deck::from_reader(Cursor::new(text), names)
    }

    fn written(deck: &Deck) -> String {
        let mut out = Vec::new();
        deck.write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn guid_column_example() {
        let (deck, log) = parse("#separator:tab\n#guid column:1\na\tb\tc\n", NO_NAMES).unwrap();
        assert!(log.is_empty());
        assert_eq!(deck.len(), 1);
        let card = &deck.cards()[0];
        assert_eq!(card.iter().collect::<Vec<_>>(), [("GUID", "a"), ("Field1", "b"), ("Field2", "c")]);
        assert_eq!(deck.header_setting(SettingKey::GuidColumn), Some(&SettingValue::Integer(0)));
        assert_eq!(written(&deck), "#separator:tab\n#guid column:1\na\tb\tc\r\n");
    }

    #[test]
    fn headerless_file_reads_all_rows() {
        let (deck, _) = parse("a\tb\nc\td\n", &["Front", "Back"]).unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.cards()[1].get("Back").unwrap(), "d");
        assert_eq!(written(&deck), "a\tb\r\nc\td\r\n");
    }

    #[test]
    fn header_only_file_has_no_cards() {
        let (deck, _) = parse("#separator:tab\n#html:false\n", NO_NAMES).unwrap();
        assert!(deck.is_empty());
        assert_eq!(written(&deck), "#separator:tab\n#html:false\n");
    }

    #[test]
    fn other_separators_are_rejected() {
        let err = parse("#separator:comma\na,b\n", NO_NAMES).unwrap_err();
        assert!(matches!(err, DeckError::UnsupportedSeparator(SettingValue::Text(ref s)) if s == "comma"));
    }

    #[test]
    fn malformed_header_is_fatal() {
        let err = parse("#separator\na\n", NO_NAMES).unwrap_err();
        assert!(matches!(err, DeckError::Header(HeaderError::MalformedLine(_))));
    }

    #[test]
    fn short_row_under_declared_column_is_fatal() {
        let err = parse("#tags column:3\na\tb\tc\nd\te\n", NO_NAMES).unwrap_err();
        assert!(matches!(err, DeckError::ColumnOutOfRange { row: 1, column: 2, field_count: 2 }));
    }

    #[test]
    fn diagnostics_are_reported_per_row() {
        let (deck, log) = parse("#deck column:1\na\tb\nc\td\n", &["Foo", "Back"]).unwrap();
        assert_eq!(deck.cards()[0].deck_name().unwrap(), "a");
        assert_eq!(log.len(), 2);
        assert!(log.entries().iter().all(|d| matches!(d, Diagnostic::HeaderFieldNameMismatch { .. })));
    }

    #[test]
    fn naming_failure_carries_row() {
        let err = parse("a\tb\n", &["Field1"]).unwrap_err();
        assert!(matches!(err, DeckError::Card { row: 0, source: CardError::Resolve(_) }));
    }

    #[test]
    fn append_adds_to_end() {
        let (mut deck, _) = parse("#separator:tab\na\n", NO_NAMES).unwrap();
        deck.append(Card::from_named(vec!["Other".into(), "Second".into()], vec!["x", "y"]).unwrap());
        assert_eq!(deck.len(), 2);
        assert_eq!(written(&deck), "#separator:tab\na\r\nx\ty\r\n");
    }

    #[test]
    fn quoted_fields_survive_round_trip() {
        let text = "#separator:tab\n\"multi\nline\"\t\"a \"\"quote\"\"\"\r\n";
        let (deck, _) = parse(text, NO_NAMES).unwrap();
        assert_eq!(deck.cards()[0].get("Field0").unwrap(), "multi\nline");
        assert_eq!(deck.cards()[0].get("Field1").unwrap(), "a \"quote\"");
        assert_eq!(written(&deck), text);
    }

    #[test]
    fn leading_marker_in_first_row_is_quoted() {
        let mut header = HeaderSettings::new();
        header.set(SettingKey::Separator, "tab");
        let names = || vec!["Field0".to_string(), "Field1".to_string()];
        let deck = Deck::new(header, vec![
            Card::from_named(names(), vec!["#python", "snake"]).unwrap(),
            Card::from_named(names(), vec!["#rust", "crab"]).unwrap(),
        ]);

        let text = written(&deck);
        assert_eq!(text, "#separator:tab\n\"#python\"\t\"snake\"\r\n#rust\tcrab\r\n");
        let (reread, _) = parse(&text, NO_NAMES).unwrap();
        assert_eq!(reread, deck);
    }

    #[test]
    fn blank_body_lines_are_skipped() {
        let (deck, _) = parse("#separator:tab\na\tb\n\n\r\nc\td\n", NO_NAMES).unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.cards()[1].get("Field0").unwrap(), "c");
    }

    #[test]
    fn crlf_rows_parse_like_lf() {
        let (lf, _) = parse("#separator:tab\na\tb\n", NO_NAMES).unwrap();
        let (crlf, _) = parse("#separator:tab\r\na\tb\r\n", NO_NAMES).unwrap();
        assert_eq!(lf, crlf);
    }
}
