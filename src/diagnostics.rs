//! Recoverable anomalies found while naming fields.
//!
//! Nothing in here aborts a parse. Whoever triggers parsing hands in a
//! [`DiagnosticSink`]; every naming conflict the resolver works around is
//! pushed into it as a [`Diagnostic`]. [`DiagnosticLog`] also traces each one
//! at `DEBUG`.

use std::fmt;

use serde::Serialize;

/// A naming inconsistency and the fallback that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A candidate name was already claimed; `replacement` was used instead.
    DuplicateName {
        context:     String,
        original:    String,
        replacement: String,
    },
    /// More candidate names than fields. The extra names are ignored.
    LeftoverNames {
        context: String,
        names:   Vec<String>,
    },
    /// A candidate name contradicts a header-declared column. The header wins.
    HeaderFieldNameMismatch {
        overwritten: String,
        replacement: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateName { context, original, replacement } => {
                write!(f, "Duplicate {context} (replaced with: {replacement}): {original}")
            }
            Diagnostic::LeftoverNames { context, names } => {
                write!(f, "{context}, ignored: {}", names.join(" "))
            }
            Diagnostic::HeaderFieldNameMismatch { overwritten, replacement } => {
                write!(f, "Field name {overwritten} overwritten by header column name {replacement}")
            }
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move everything collected here into another sink.
    pub fn drain_into(&mut self, sink: &mut dyn DiagnosticSink) {
        for diagnostic in self.entries.drain(..) {
            sink.emit(diagnostic);
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn emit(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "field naming");
        self.entries.push(diagnostic);
    }
}

impl<'a> IntoIterator for &'a DiagnosticLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Closures work as sinks, e.g. to forward into a channel.
impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}
