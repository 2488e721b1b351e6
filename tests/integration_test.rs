use gaggle::gaggle::{Gaggle, GaggleError, WriteOptions};
use gaggle::{parse_deck, Deck, DeckError, Diagnostic, ReservedField, SettingKey, SettingValue};
use std::fs;
use std::io::{BufReader, Cursor};
use tempfile::{NamedTempFile, TempDir};

const NUM_FIELDS: usize = 7;
const WELL_FORMED_HEADER: &str = "#separator:tab\n#html:true\n#guid column:1\n\
                                  #notetype column:2\n#deck column:3\n#tags column:7\n";

fn well_formed_rows(num_cards: usize) -> String {
    let mut out = String::new();
    for card in 0..num_cards {
        let row: Vec<String> = (0..NUM_FIELDS).map(|f| format!("card{card}_field{f}")).collect();
        out.push_str(&row.join("\t"));
        out.push_str("\r\n");
    }
    out
}

fn export_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), contents).unwrap();
    file
}

#[test]
fn test_well_formed_export_from_file() {
    let file = export_file(&format!("{WELL_FORMED_HEADER}{}", well_formed_rows(20)));
    let (deck, log) = Deck::from_path(file.path(), &[] as &[&str]).unwrap();

    assert!(log.is_empty());
    assert_eq!(deck.len(), 20);
    assert_eq!(deck.header_setting(SettingKey::TagsColumn), Some(&SettingValue::Integer(6)));
    assert!(deck.header().has_html().unwrap());

    let card = &deck.cards()[3];
    assert_eq!(card.guid().unwrap(), "card3_field0");
    assert_eq!(card.note_type().unwrap(), "card3_field1");
    assert_eq!(card.deck_name().unwrap(), "card3_field2");
    assert_eq!(card.tags().unwrap(), "card3_field6");
    assert_eq!(card.get("Field4").unwrap(), "card3_field4");
    assert_eq!(
        card.names().collect::<Vec<_>>(),
        ["GUID", "Note Type", "Deck", "Field3", "Field4", "Field5", "Tags"]
    );
}

#[test]
fn test_headerless_export() {
    let file = export_file(&well_formed_rows(20));
    let (deck, _) = Deck::from_path(file.path(), &["Front", "Back"]).unwrap();
    assert!(deck.header().is_empty());
    assert_eq!(deck.len(), 20);
    assert_eq!(deck.cards()[0].get("Front").unwrap(), "card0_field0");
    assert_eq!(deck.cards()[0].get("Field6").unwrap(), "card0_field6");
    assert!(deck.cards()[0].get_reserved(ReservedField::Tags).is_err());
}

#[test]
fn test_header_without_content() {
    let file = export_file(WELL_FORMED_HEADER);
    let (deck, _) = Deck::from_path(file.path(), &[] as &[&str]).unwrap();
    assert!(deck.is_empty());
    assert_eq!(deck.header().len(), 6);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Deck::from_path(dir.path().join("absent.txt"), &[] as &[&str]).unwrap_err();
    assert!(matches!(err, DeckError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
}

#[test]
fn test_write_reproduces_file_byte_for_byte() {
    let original = format!("{WELL_FORMED_HEADER}{}", well_formed_rows(5));
    let (deck, _) = parse_deck(BufReader::new(Cursor::new(original.as_bytes())), &[] as &[&str]).unwrap();
    let mut out = Vec::new();
    deck.write(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), original);
}

#[test]
fn test_user_names_reconciled_with_header() {
    let text = format!("{WELL_FORMED_HEADER}{}", well_formed_rows(2));
    let names = ["ID", "", "Deck", "Front", "Back", "Front", "Labels", "Spare"];
    let (deck, log) = parse_deck(Cursor::new(text), &names).unwrap();

    let card = &deck.cards()[0];
    assert_eq!(
        card.names().collect::<Vec<_>>(),
        ["GUID", "Note Type", "Deck", "Front", "Back", "Field5", "Tags"]
    );

    // Per row: ID and Labels contradict the header, Front repeats, Spare is extra.
    let per_row = [
        Diagnostic::HeaderFieldNameMismatch { overwritten: "ID".into(), replacement: "GUID".into() },
        Diagnostic::DuplicateName {
            context:     "field name".into(),
            original:    "Front".into(),
            replacement: "Field5".into(),
        },
        Diagnostic::HeaderFieldNameMismatch { overwritten: "Labels".into(), replacement: "Tags".into() },
        Diagnostic::LeftoverNames {
            context: "More field names than fields".into(),
            names:   vec!["Spare".into()],
        },
    ];
    let expected: Vec<Diagnostic> = per_row.iter().chain(per_row.iter()).cloned().collect();
    assert_eq!(log.entries(), expected.as_slice());
}

#[test]
fn test_gaggle_writes_unique_files() {
    let src = export_file(&format!("{WELL_FORMED_HEADER}{}", well_formed_rows(3)));
    let out_dir = TempDir::new().unwrap();

    let (mut gaggle, _) = Gaggle::from_path(src.path(), &[] as &[&str]).unwrap();
    gaggle.add_deck_from_path(src.path(), &["a"]).unwrap();
    assert_eq!(gaggle.len(), 2);

    let opts = WriteOptions {
        destination: out_dir.path().to_path_buf(),
        extension:   ".txt".into(),
        ..WriteOptions::named("deck")
    };
    let paths = gaggle.write_all_decks_to_file(&[opts.clone(), opts]).unwrap();
    assert_eq!(paths, [out_dir.path().join("deck.txt"), out_dir.path().join("deck0.txt")]);

    for path in &paths {
        let (reread, _) = Deck::from_path(path, &[] as &[&str]).unwrap();
        assert_eq!(&reread, gaggle.get_deck(0).unwrap());
    }
}

#[test]
fn test_unsupported_file_type() {
    let err = "apkg".parse::<gaggle::FileType>().unwrap_err();
    assert!(matches!(err, GaggleError::UnsupportedFileType(_)));
    assert!(err.to_string().contains("apkg"));
}
