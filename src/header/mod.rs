//! Header block codec: the `#key:value` lines that open an export file.
//!
//! # Two naming styles
//! On disk ("wire" form) keys are spaced words (`guid column`) and column
//! numbers are 1-indexed. In memory ("internal" form) keys are snake case
//! (`guid_idx`) and columns are 0-indexed. [`parse`] always returns internal
//! form; [`serialize`] and [`write`] accept either and emit wire form.
//!
//! # Canonical order
//! Settings are written separator, html, guid, notetype, deck, tags. The
//! read order is free. A setting that is absent is simply not written.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};

use serde::Serialize;
use thiserror::Error;

/// First byte of every header line.
pub const HEADER_LINE_MARKER: u8 = b'#';
/// Separates a setting key from its value.
pub const HEADER_DELIMITER: char = ':';

pub const SEPARATOR_TAB: &str = "tab";
pub const HEADER_TRUE: &str = "true";
pub const HEADER_FALSE: &str = "false";

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed header line (no ':' found): {0:?}")]
    MalformedLine(String),
    #[error("Unknown header setting: {0:?}")]
    UnknownSetting(String),
    #[error("Header setting {key} must be a column number, got {value}")]
    InvalidColumn { key: SettingKey, value: SettingValue },
    #[error("Header settings {first} and {second} both claim column {column}")]
    DuplicateColumn { first: SettingKey, second: SettingKey, column: usize },
    #[error("Expected true or false but instead got {0}")]
    InvalidBoolean(SettingValue),
}

// ── SettingKey ───────────────────────────────────────────────────────────────

/// Every header setting this crate understands.
///
/// Variant order is the canonical write order. Serializes under the
/// internal name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SettingKey {
    #[serde(rename = "separator")]
    Separator,
    #[serde(rename = "has_html")]
    Html,
    #[serde(rename = "guid_idx")]
    GuidColumn,
    #[serde(rename = "note_type_idx")]
    NotetypeColumn,
    #[serde(rename = "deck_idx")]
    DeckColumn,
    #[serde(rename = "tags_idx")]
    TagsColumn,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::Separator,
        SettingKey::Html,
        SettingKey::GuidColumn,
        SettingKey::NotetypeColumn,
        SettingKey::DeckColumn,
        SettingKey::TagsColumn,
    ];

    /// Key as written in an export file.
    pub fn wire_name(self) -> &'static str {
        match self {
            SettingKey::Separator      => "separator",
            SettingKey::Html           => "html",
            SettingKey::GuidColumn     => "guid column",
            SettingKey::NotetypeColumn => "notetype column",
            SettingKey::DeckColumn     => "deck column",
            SettingKey::TagsColumn     => "tags column",
        }
    }

    /// Key as used in memory.
    pub fn internal_name(self) -> &'static str {
        match self {
            SettingKey::Separator      => "separator",
            SettingKey::Html           => "has_html",
            SettingKey::GuidColumn     => "guid_idx",
            SettingKey::NotetypeColumn => "note_type_idx",
            SettingKey::DeckColumn     => "deck_idx",
            SettingKey::TagsColumn     => "tags_idx",
        }
    }

    pub fn from_wire_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_name() == s)
    }

    pub fn from_internal_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.internal_name() == s)
    }

    /// Column settings carry an index that shifts between the two forms.
    pub fn is_column(self) -> bool {
        matches!(
            self,
            SettingKey::GuidColumn
                | SettingKey::NotetypeColumn
                | SettingKey::DeckColumn
                | SettingKey::TagsColumn
        )
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ── SettingValue ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    Text(String),
}

impl SettingValue {
    /// Integer if the text reads as one, text otherwise.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n)  => SettingValue::Integer(n),
            Err(_) => SettingValue::Text(raw.to_owned()),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(n) => Some(*n),
            SettingValue::Text(_)    => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s)    => Some(s),
            SettingValue::Integer(_) => None,
        }
    }

    fn translated(&self, by: i64) -> Self {
        match self {
            SettingValue::Integer(n) => SettingValue::Integer(n.saturating_add(by)),
            other                    => other.clone(),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Integer(n) => write!(f, "{n}"),
            SettingValue::Text(s)    => f.write_str(s),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Text(s.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Text(s)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        SettingValue::Integer(n)
    }
}

impl From<usize> for SettingValue {
    fn from(n: usize) -> Self {
        SettingValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

// ── HeaderSettings ───────────────────────────────────────────────────────────

/// Conversion between the two naming styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformatDirection {
    AnkiToGaggle,
    GaggleToAnki,
}

impl ReformatDirection {
    fn column_shift(self) -> i64 {
        match self {
            ReformatDirection::AnkiToGaggle => -1,
            ReformatDirection::GaggleToAnki => 1,
        }
    }
}

/// Which naming style a [`HeaderSettings`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderForm {
    Wire,
    Internal,
}

/// Header settings of one deck.
///
/// Serializes as a flat map of the settings in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSettings {
    #[serde(skip)]
    form:     HeaderForm,
    #[serde(flatten)]
    settings: BTreeMap<SettingKey, SettingValue>,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderSettings {
    /// Empty settings in internal form.
    pub fn new() -> Self {
        Self { form: HeaderForm::Internal, settings: BTreeMap::new() }
    }

    /// Empty settings in wire form, as read straight from a file.
    pub fn new_wire() -> Self {
        Self { form: HeaderForm::Wire, settings: BTreeMap::new() }
    }

    pub fn form(&self) -> HeaderForm {
        self.form
    }

    pub fn get(&self, key: SettingKey) -> Option<&SettingValue> {
        self.settings.get(&key)
    }

    pub fn get_or<'a>(&'a self, key: SettingKey, default: &'a SettingValue) -> &'a SettingValue {
        self.settings.get(&key).unwrap_or(default)
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<SettingValue>) -> Option<SettingValue> {
        self.settings.insert(key, value.into())
    }

    /// Removing a setting keeps it out of the written header.
    pub fn remove(&mut self, key: SettingKey) -> Option<SettingValue> {
        self.settings.remove(&key)
    }

    pub fn contains(&self, key: SettingKey) -> bool {
        self.settings.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Settings in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &SettingValue)> {
        self.settings.iter().map(|(k, v)| (*k, v))
    }

    /// Convert between naming styles in place. Converting to the form the
    /// settings are already in does nothing.
    pub fn reformat(&mut self, direction: ReformatDirection) {
        let target = match direction {
            ReformatDirection::AnkiToGaggle => HeaderForm::Internal,
            ReformatDirection::GaggleToAnki => HeaderForm::Wire,
        };
        if self.form == target {
            return;
        }
        let shift = direction.column_shift();
        for (key, value) in self.settings.iter_mut() {
            if key.is_column() {
                *value = value.translated(shift);
            }
        }
        self.form = target;
    }

    /// Copy of these settings converted to `direction`.
    pub fn reformatted(&self, direction: ReformatDirection) -> Self {
        let mut copy = self.clone();
        copy.reformat(direction);
        copy
    }

    /// Internal (0-based) column index declared for `key`.
    ///
    /// `Ok(None)` when the setting is absent; an error when it is present but
    /// is not a usable column number.
    pub fn column(&self, key: SettingKey) -> Result<Option<usize>, HeaderError> {
        let Some(value) = self.settings.get(&key) else {
            return Ok(None);
        };
        let base = match self.form {
            HeaderForm::Internal => 0,
            HeaderForm::Wire     => 1,
        };
        value
            .as_integer()
            .and_then(|n| n.checked_sub(base))
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| HeaderError::InvalidColumn { key, value: value.clone() })
    }

    /// All declared columns, checked for validity and overlap.
    pub fn columns(&self) -> Result<Vec<(SettingKey, usize)>, HeaderError> {
        let mut columns: Vec<(SettingKey, usize)> = Vec::new();
        for key in SettingKey::ALL.into_iter().filter(|k| k.is_column()) {
            if let Some(column) = self.column(key)? {
                if let Some((first, _)) = columns.iter().find(|(_, c)| *c == column) {
                    return Err(HeaderError::DuplicateColumn { first: *first, second: key, column });
                }
                columns.push((key, column));
            }
        }
        Ok(columns)
    }

    /// The `html` setting. Absent means `false`.
    pub fn has_html(&self) -> Result<bool, HeaderError> {
        match self.settings.get(&SettingKey::Html) {
            None => Ok(false),
            Some(SettingValue::Text(s)) if s == HEADER_TRUE  => Ok(true),
            Some(SettingValue::Text(s)) if s == HEADER_FALSE => Ok(false),
            Some(other) => Err(HeaderError::InvalidBoolean(other.clone())),
        }
    }
}

// ── Codec ────────────────────────────────────────────────────────────────────

/// Read the header block in wire form.
///
/// Consumes lines while their first byte is [`HEADER_LINE_MARKER`]; the
/// reader is left at the first line that is not part of the header.
pub fn read_wire<R: BufRead>(reader: &mut R) -> Result<HeaderSettings, HeaderError> {
    let mut header = HeaderSettings::new_wire();
    let mut line = String::new();
    loop {
        let next = reader.fill_buf()?;
        if next.first() != Some(&HEADER_LINE_MARKER) {
            break;
        }
        reader.consume(1);
        line.clear();
        reader.read_line(&mut line)?;

        let (key, value) = line
            .split_once(HEADER_DELIMITER)
            .ok_or_else(|| HeaderError::MalformedLine(line.trim_end().to_owned()))?;
        let key = SettingKey::from_wire_name(key)
            .ok_or_else(|| HeaderError::UnknownSetting(key.to_owned()))?;
        let value = SettingValue::parse(value.trim_end());
        tracing::trace!(%key, %value, "header setting");
        header.settings.insert(key, value);
    }
    Ok(header)
}

/// Read the header block and convert it to internal form.
pub fn parse<R: BufRead>(reader: &mut R) -> Result<HeaderSettings, HeaderError> {
    let mut header = read_wire(reader)?;
    header.reformat(ReformatDirection::AnkiToGaggle);
    Ok(header)
}

/// Header block text in wire form, one `\n`-terminated line per setting.
pub fn serialize(settings: &HeaderSettings) -> String {
    let wire = settings.reformatted(ReformatDirection::GaggleToAnki);
    let mut out = String::new();
    for (key, value) in wire.iter() {
        out.push(HEADER_LINE_MARKER as char);
        out.push_str(key.wire_name());
        out.push(HEADER_DELIMITER);
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

pub fn write<W: Write>(mut writer: W, settings: &HeaderSettings) -> io::Result<()> {
    writer.write_all(serialize(settings).as_bytes())
}
