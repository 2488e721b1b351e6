pub mod diagnostics;
pub mod header;
pub mod tsv;
pub mod field_names;
pub mod card;
pub mod deck;
pub mod gaggle;

pub use diagnostics::{Diagnostic, DiagnosticLog, DiagnosticSink};
pub use header::{HeaderError, HeaderSettings, SettingKey, SettingValue};
pub use field_names::{NameResolutionContext, ReservedField, ResolveError};
pub use card::{Card, CardError};
pub use deck::{Deck, DeckError};
pub use gaggle::{FileType, Gaggle, GaggleError, WriteOptions};

/// Parse one export stream. `field_names` may be empty.
pub fn parse_deck<R, S>(reader: R, field_names: &[S]) -> Result<(Deck, DiagnosticLog), DeckError>
where
    R: std::io::BufRead,
    S: AsRef<str>,
{
    Deck::from_reader(reader, field_names)
}
