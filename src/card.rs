//! One exported note: field values keyed by resolved field name.
//!
//! Field order is column order in the source row and is kept for
//! serialization. Names are unique within a card.
//!
//! Reference for the reserved header columns:
//! <https://docs.ankiweb.net/importing.html#file-headers>

use std::fmt;
use std::io;

use thiserror::Error;

use crate::diagnostics::DiagnosticSink;
use crate::field_names::{NameResolutionContext, ReservedField, ResolveError};
use crate::tsv::RowSink;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("No field named {0:?}")]
    NotFound(String),
    #[error("Resolved {names} names for {values} values")]
    LengthMismatch { names: usize, values: usize },
    #[error("A card needs at least one field")]
    NoFields,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    fields: Vec<(String, String)>,
}

impl Card {
    /// Name `values` through `ctx` and build the card.
    ///
    /// Every naming conflict the resolver works around goes to `sink`.
    pub fn from_fields<V, S>(
        values:     Vec<V>,
        candidates: &[S],
        ctx:        &NameResolutionContext,
        sink:       &mut dyn DiagnosticSink,
    ) -> Result<Self, CardError>
    where
        V: Into<String>,
        S: AsRef<str>,
    {
        let names = ctx.resolve(candidates, values.len(), sink)?;
        Self::from_named(names, values)
    }

    /// Pair already-resolved names with values. Names must be unique.
    ///
    /// An empty row cannot be written back distinctly, so zero fields is an
    /// error.
    pub fn from_named<V: Into<String>>(names: Vec<String>, values: Vec<V>) -> Result<Self, CardError> {
        if values.is_empty() {
            return Err(CardError::NoFields);
        }
        if names.len() != values.len() {
            return Err(CardError::LengthMismatch { names: names.len(), values: values.len() });
        }
        let fields = names.into_iter().zip(values.into_iter().map(Into::into)).collect();
        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Result<&str, CardError> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| CardError::NotFound(name.to_owned()))
    }

    pub fn get_reserved(&self, field: ReservedField) -> Result<&str, CardError> {
        self.get(field.canonical_name())
    }

    /// Anki tags, space separated; hierarchical tags use `::`.
    pub fn tags(&self) -> Result<&str, CardError> {
        self.get_reserved(ReservedField::Tags)
    }

    /// Full deck path, outermost first, e.g. `Languages::French::Verbs`.
    pub fn deck_name(&self) -> Result<&str, CardError> {
        self.get_reserved(ReservedField::Deck)
    }

    pub fn note_type(&self) -> Result<&str, CardError> {
        self.get_reserved(ReservedField::NoteType)
    }

    /// Anki's note GUID. Matching GUIDs update existing notes on import.
    pub fn guid(&self) -> Result<&str, CardError> {
        self.get_reserved(ReservedField::Guid)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Values in column order.
    pub fn as_ordered_values(&self) -> Vec<&str> {
        self.fields.iter().map(|(_, v)| v.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Write the values as one row.
    pub fn write_row<S: RowSink + ?Sized>(&self, sink: &mut S) -> io::Result<()> {
        sink.write_row(&self.as_ordered_values())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name:?}: {value:?}")?;
        }
        f.write_str("}")
    }
}
