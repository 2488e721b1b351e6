use gaggle::{parse_deck, Deck, HeaderSettings, SettingKey, SettingValue};
use gaggle::card::Card;
use gaggle::field_names::default_name;
use proptest::prelude::*;
use std::io::Cursor;

fn header_strategy() -> impl Strategy<Value = HeaderSettings> {
    (
        proptest::option::of(Just("tab")),
        proptest::option::of(prop_oneof![Just("true"), Just("false")]),
        proptest::sample::subsequence(
            vec![SettingKey::GuidColumn, SettingKey::NotetypeColumn, SettingKey::DeckColumn, SettingKey::TagsColumn],
            0..=4,
        ),
        proptest::sample::subsequence((0..8usize).collect::<Vec<_>>(), 4),
    )
        .prop_map(|(separator, html, keys, columns)| {
            let mut header = HeaderSettings::new();
            if let Some(s) = separator {
                header.set(SettingKey::Separator, s);
            }
            if let Some(h) = html {
                header.set(SettingKey::Html, h);
            }
            for (key, column) in keys.into_iter().zip(columns) {
                header.set(key, column);
            }
            header
        })
}

fn field_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 #\"\n]{0,12}"
}

proptest! {
    #[test]
    fn header_survives_serialize_then_parse(header in header_strategy()) {
        let text = gaggle::header::serialize(&header);
        let parsed = gaggle::header::parse(&mut Cursor::new(text.as_bytes())).unwrap();
        prop_assert_eq!(parsed, header);
    }

    #[test]
    fn written_rows_read_back_unchanged(
        rows in proptest::collection::vec(proptest::collection::vec(field_strategy(), 2..6), 0..8),
    ) {
        let cards: Vec<Card> = rows
            .iter()
            .map(|row| {
                let names = (0..row.len()).map(default_name).collect();
                Card::from_named(names, row.clone()).unwrap()
            })
            .collect();
        let mut header = HeaderSettings::new();
        header.set(SettingKey::Separator, "tab");
        let deck = Deck::new(header, cards);

        let mut out = Vec::new();
        deck.write(&mut out).unwrap();
        let (reread, log) = parse_deck(Cursor::new(out), &[] as &[&str]).unwrap();
        prop_assert!(log.is_empty());
        prop_assert_eq!(reread, deck);
    }
}

#[test]
fn column_settings_are_integers_after_parse() {
    let header = gaggle::header::parse(&mut Cursor::new("#tags column:4\n#separator:tab\n")).unwrap();
    assert_eq!(header.get(SettingKey::TagsColumn), Some(&SettingValue::Integer(3)));
    assert_eq!(header.get(SettingKey::Separator), Some(&SettingValue::Text("tab".into())));
}
