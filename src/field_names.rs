//! Field naming: turn a caller's candidate names into one unique name per
//! field.
//!
//! # Rules
//! Names are assigned position by position.
//!
//! * A position claimed by a header column (GUID, Note Type, Deck, Tags)
//!   always gets the reserved name. A different non-empty candidate there is
//!   reported as [`Diagnostic::HeaderFieldNameMismatch`] and dropped.
//! * Elsewhere a candidate that is already taken is reported as
//!   [`Diagnostic::DuplicateName`] and replaced by the default name.
//! * Missing or empty candidates get the default name `Field{index}`. The
//!   index is the column position, so reserved columns leave holes in the
//!   numbering instead of shifting it.
//! * If a default name is itself taken the naming cannot be repaired and
//!   [`ResolveError::DefaultNameTaken`] is returned.
//! * Candidates beyond the last field are reported as
//!   [`Diagnostic::LeftoverNames`].
//!
//! A mismatch at a reserved position suppresses the duplicate check there.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::header::{HeaderError, HeaderSettings, SettingKey};

pub const DEFAULT_NAME_PREFIX: &str = "Field";
const DUPLICATE_CONTEXT: &str = "field name";
const LEFTOVER_CONTEXT: &str = "More field names than fields";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Index-associated generic name duplicated at column {index}. Duplicated value: {name}")]
    DefaultNameTaken { name: String, index: usize },
}

// ── ReservedField ────────────────────────────────────────────────────────────

/// Columns whose role is declared by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedField {
    Tags,
    Deck,
    NoteType,
    Guid,
}

/// All reserved fields, in the order their names are claimed.
pub const RESERVED_FIELDS: [ReservedField; 4] = [
    ReservedField::Tags,
    ReservedField::Deck,
    ReservedField::NoteType,
    ReservedField::Guid,
];

impl ReservedField {
    pub fn canonical_name(self) -> &'static str {
        match self {
            ReservedField::Tags     => "Tags",
            ReservedField::Deck     => "Deck",
            ReservedField::NoteType => "Note Type",
            ReservedField::Guid     => "GUID",
        }
    }

    /// The header setting that declares this field's column.
    pub fn setting_key(self) -> SettingKey {
        match self {
            ReservedField::Tags     => SettingKey::TagsColumn,
            ReservedField::Deck     => SettingKey::DeckColumn,
            ReservedField::NoteType => SettingKey::NotetypeColumn,
            ReservedField::Guid     => SettingKey::GuidColumn,
        }
    }
}

impl fmt::Display for ReservedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Default name for the field at `index`.
pub fn default_name(index: usize) -> String {
    format!("{DEFAULT_NAME_PREFIX}{index}")
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// Produce exactly `field_count` unique names.
///
/// `reserved` maps column index to reserved name. `seen` holds every name
/// that may not be handed out from `candidates`; it must already contain the
/// reserved names and is extended with every non-reserved name produced.
pub fn resolve<S: AsRef<str>>(
    candidates:  &[S],
    field_count: usize,
    reserved:    &BTreeMap<usize, String>,
    seen:        &mut HashSet<String>,
    sink:        &mut dyn DiagnosticSink,
) -> Result<Vec<String>, ResolveError> {
    let mut names = Vec::with_capacity(field_count);
    let mut candidates = candidates.iter().map(|s| s.as_ref());

    for count in 0.. {
        let candidate = candidates.next();
        if count >= field_count {
            if let Some(first) = candidate {
                let leftovers = std::iter::once(first)
                    .chain(candidates.by_ref())
                    .map(str::to_owned)
                    .collect();
                sink.emit(Diagnostic::LeftoverNames {
                    context: LEFTOVER_CONTEXT.to_owned(),
                    names:   leftovers,
                });
            }
            break;
        }

        if let Some(reserved_name) = reserved.get(&count) {
            if let Some(name) = candidate.filter(|n| !n.is_empty() && *n != reserved_name.as_str()) {
                sink.emit(Diagnostic::HeaderFieldNameMismatch {
                    overwritten: name.to_owned(),
                    replacement: reserved_name.clone(),
                });
            }
            names.push(reserved_name.clone());
            continue;
        }

        let mut candidate = candidate.filter(|n| !n.is_empty());
        if let Some(name) = candidate.filter(|n| seen.contains(*n)) {
            sink.emit(Diagnostic::DuplicateName {
                context:     DUPLICATE_CONTEXT.to_owned(),
                original:    name.to_owned(),
                replacement: default_name(count),
            });
            candidate = None;
        }

        let name = match candidate {
            Some(name) => name.to_owned(),
            None => {
                let generated = default_name(count);
                if seen.contains(&generated) {
                    return Err(ResolveError::DefaultNameTaken { name: generated, index: count });
                }
                generated
            }
        };
        seen.insert(name.clone());
        names.push(name);
    }

    Ok(names)
}

// ── NameResolutionContext ────────────────────────────────────────────────────

/// Naming state shared by every row of one deck: the reserved column table
/// and the names no candidate may take.
///
/// Each row is named against a fresh copy of the protected set, so names
/// are unique within a row and rows do not constrain each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameResolutionContext {
    reserved:  BTreeMap<usize, String>,
    protected: HashSet<String>,
}

impl Default for NameResolutionContext {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

impl NameResolutionContext {
    /// Context for the given `(field, column)` declarations.
    pub fn new(bindings: impl IntoIterator<Item = (ReservedField, usize)>) -> Self {
        let reserved = bindings
            .into_iter()
            .map(|(field, column)| (column, field.canonical_name().to_owned()))
            .collect();
        let protected = RESERVED_FIELDS
            .iter()
            .map(|f| f.canonical_name().to_owned())
            .collect();
        Self { reserved, protected }
    }

    /// Context for the columns declared in `header`.
    pub fn from_header(header: &HeaderSettings) -> Result<Self, HeaderError> {
        header.columns()?;
        let mut bindings = Vec::new();
        for field in RESERVED_FIELDS {
            if let Some(column) = header.column(field.setting_key())? {
                bindings.push((field, column));
            }
        }
        Ok(Self::new(bindings))
    }

    /// Also keep `names` away from candidates.
    pub fn protect<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn reserved(&self) -> &BTreeMap<usize, String> {
        &self.reserved
    }

    /// Column declared for `field`, if any.
    pub fn column_of(&self, field: ReservedField) -> Option<usize> {
        let name = field.canonical_name();
        self.reserved.iter().find(|(_, n)| n.as_str() == name).map(|(c, _)| *c)
    }

    /// Highest reserved column, if any.
    pub fn last_reserved_column(&self) -> Option<usize> {
        self.reserved.keys().next_back().copied()
    }

    /// Name one row of `field_count` fields.
    pub fn resolve<S: AsRef<str>>(
        &self,
        candidates:  &[S],
        field_count: usize,
        sink:        &mut dyn DiagnosticSink,
    ) -> Result<Vec<String>, ResolveError> {
        let mut seen = self.protected.clone();
        resolve(candidates, field_count, &self.reserved, &mut seen, sink)
    }
}
