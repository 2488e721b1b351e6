//! A collection of decks and the file-level write surface.
//!
//! ```no_run
//! use gaggle::gaggle::{Gaggle, WriteOptions};
//!
//! let (mut gaggle, _diagnostics) = Gaggle::from_path("export.txt", &["Front", "Back"])?;
//! gaggle.add_deck_from_path("other.txt", &[] as &[&str])?;
//! let written = gaggle.write_all_decks_to_file(&[WriteOptions::named("copy")])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Output paths
//! Writes never replace an existing file. [`unique_file_path`] picks a free
//! name and the file is then opened with create-new semantics, so a file
//! that appears in between makes the write fail instead of clobbering it.
//! The check and the create are not atomic.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::deck::{Deck, DeckError};
use crate::diagnostics::{DiagnosticLog, DiagnosticSink};

/// Base name used when no filename is requested.
pub const GENERIC_EXPORT_FILE_NAME: &str = "GaggleFile";
pub const NOTES_IN_PLAIN_TEXT_EXT: &str = ".txt";

#[derive(Error, Debug)]
pub enum GaggleError {
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to write Deck to file. Expected a valid file type but instead got {0:?}")]
    UnsupportedFileType(String),
    #[error("No deck at index {index} (have {len})")]
    DeckIndex { index: usize, len: usize },
    #[error("Failed to write all Decks to the file. Last deck successfully written was the deck at: Index {}",
            .last_written.map_or_else(|| "None".to_string(), |i| i.to_string()))]
    DecksNotWritten {
        last_written: Option<usize>,
        #[source]
        source: Box<GaggleError>,
    },
}

// ── FileType ──────────────────────────────────────────────────────────────────

/// Export flavours this crate can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Anki "Notes in Plain Text".
    #[default]
    NotesInPlainText,
}

impl FileType {
    pub fn extension(self) -> &'static str {
        match self {
            FileType::NotesInPlainText => NOTES_IN_PLAIN_TEXT_EXT,
        }
    }
}

impl FromStr for FileType {
    type Err = GaggleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            NOTES_IN_PLAIN_TEXT_EXT | "txt" | "notes" => Ok(FileType::NotesInPlainText),
            other => Err(GaggleError::UnsupportedFileType(other.to_owned())),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ── WriteOptions ──────────────────────────────────────────────────────────────

/// Where and how [`Gaggle::write_deck_to_file`] writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// File stem. `None` uses a numbered generic name.
    pub filename:    Option<String>,
    pub file_type:   FileType,
    pub destination: PathBuf,
    /// Appended after the stem. Naming only, the content is unaffected.
    pub extension:   String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            filename:    None,
            file_type:   FileType::default(),
            destination: PathBuf::from("."),
            extension:   String::new(),
        }
    }
}

impl WriteOptions {
    pub fn named(filename: impl Into<String>) -> Self {
        Self { filename: Some(filename.into()), ..Self::default() }
    }
}

/// First path in `destination` that does not name an existing file.
///
/// Without a filename the candidates are `GaggleFile0`, `GaggleFile1`, ...
/// With one they are `name`, `name0`, `name1`, ...
pub fn unique_file_path(filename: Option<&str>, extension: &str, destination: &Path) -> PathBuf {
    let (stem, mut tag) = match filename.filter(|f| !f.is_empty()) {
        Some(name) => (name, None),
        None       => (GENERIC_EXPORT_FILE_NAME, Some(0u64)),
    };
    loop {
        let candidate = match tag {
            Some(n) => destination.join(format!("{stem}{n}{extension}")),
            None    => destination.join(format!("{stem}{extension}")),
        };
        if !candidate.is_file() {
            return candidate;
        }
        tag = Some(tag.map_or(0, |n| n + 1));
    }
}

// ── Gaggle ────────────────────────────────────────────────────────────────────

/// Decks in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gaggle {
    decks: Vec<Deck>,
}

impl Gaggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding the one deck read from `path`.
    pub fn from_path<P, S>(path: P, candidates: &[S]) -> Result<(Self, DiagnosticLog), GaggleError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let mut gaggle = Self::new();
        let log = gaggle.add_deck_from_path(path, candidates)?;
        Ok((gaggle, log))
    }

    pub fn add_deck(&mut self, deck: Deck) {
        self.decks.push(deck);
    }

    /// Read a deck from `path` and add it. Returns that deck's diagnostics.
    pub fn add_deck_from_path<P, S>(&mut self, path: P, candidates: &[S]) -> Result<DiagnosticLog, GaggleError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let (deck, log) = Deck::from_path(path, candidates)?;
        self.add_deck(deck);
        Ok(log)
    }

    /// Like [`Gaggle::add_deck_from_path`], forwarding diagnostics to `sink`
    /// as they are raised. Nothing is added on error.
    pub fn add_deck_from_path_with_sink<P, S>(
        &mut self,
        path:       P,
        candidates: &[S],
        sink:       &mut dyn DiagnosticSink,
    ) -> Result<(), GaggleError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let deck = Deck::from_path_with_sink(path, candidates, sink)?;
        self.add_deck(deck);
        Ok(())
    }

    pub fn get_deck(&self, index: usize) -> Result<&Deck, GaggleError> {
        self.decks
            .get(index)
            .ok_or(GaggleError::DeckIndex { index, len: self.decks.len() })
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Deck> {
        self.decks.iter()
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// Write the deck at `index` to a fresh file. Returns the path written.
    pub fn write_deck_to_file(&self, index: usize, opts: &WriteOptions) -> Result<PathBuf, GaggleError> {
        write_deck_to_file(self.get_deck(index)?, opts)
    }

    /// Write every deck. `opts[i]` applies to deck `i`; decks past the end of
    /// `opts` use [`WriteOptions::default`].
    pub fn write_all_decks_to_file(&self, opts: &[WriteOptions]) -> Result<Vec<PathBuf>, GaggleError> {
        let defaults = WriteOptions::default();
        let mut written = Vec::with_capacity(self.decks.len());
        for (index, deck) in self.decks.iter().enumerate() {
            let deck_opts = opts.get(index).unwrap_or(&defaults);
            match write_deck_to_file(deck, deck_opts) {
                Ok(path) => written.push(path),
                Err(e) => {
                    return Err(GaggleError::DecksNotWritten {
                        last_written: index.checked_sub(1),
                        source:       Box::new(e),
                    });
                }
            }
        }
        Ok(written)
    }
}

/// Write `deck` to a fresh file chosen by `opts`. Returns the path written.
pub fn write_deck_to_file(deck: &Deck, opts: &WriteOptions) -> Result<PathBuf, GaggleError> {
    let path = unique_file_path(opts.filename.as_deref(), &opts.extension, &opts.destination);
    let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    let mut out = BufWriter::new(file);
    match opts.file_type {
        FileType::NotesInPlainText => deck.write(&mut out)?,
    }
    out.flush()?;
    tracing::info!(path = %path.display(), cards = deck.len(), "deck written");
    Ok(path)
}

impl<'a> IntoIterator for &'a Gaggle {
    type Item = &'a Deck;
    type IntoIter = std::slice::Iter<'a, Deck>;

    fn into_iter(self) -> Self::IntoIter {
        self.decks.iter()
    }
}

impl fmt::Display for Gaggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (num, deck) in self.decks.iter().enumerate() {
            writeln!(f, "Deck {}:", num + 1)?;
            for card in deck {
                writeln!(f, "{card}")?;
            }
        }
        Ok(())
    }
}
