//! Series table and metadata table tests.

use plantlog::{MetaTable, SeriesTable, TagMeta};

fn sample_table() -> SeriesTable {
    let mut table = SeriesTable::new(vec![
        "1901-3-3 12:00".to_string(),
        "1901-3-3 13:00".to_string(),
        "1901-3-3 14:00".to_string(),
    ]);
    table.push_column("T.junk", vec![300.0, 301.0, 302.0]);
    table.push_column("P.junk", vec![101.3, 101.4, 101.5]);
    table.push_column("Pamb", vec![14.1, 14.2, 14.3]);
    table
}

#[test]
fn test_table_shape() {
    let table = sample_table();
    assert_eq!(table.len(), 3);
    assert!(!table.is_empty());
    assert_eq!(table.tags().collect::<Vec<_>>(), vec!["T.junk", "P.junk", "Pamb"]);
}

#[test]
fn test_point_lookup() {
    let table = sample_table();
    assert_eq!(table.value("T.junk", "1901-3-3 13:00"), Some(301.0));
    assert_eq!(table.value("T.junk", "1901-3-3 15:00"), None);
    assert_eq!(table.value("nope", "1901-3-3 13:00"), None);
}

#[test]
fn test_set_column() {
    let mut table = sample_table();
    assert!(table.set_column("P.junk", vec![200.0, 201.0, 202.0]));
    assert_eq!(table.column("P.junk"), Some(&[200.0, 201.0, 202.0][..]));
    assert!(!table.set_column("missing", vec![0.0, 0.0, 0.0]));
}

#[test]
fn test_rename_keeps_order_and_drops_empty() {
    let mut table = sample_table();
    table.rename_tags(&|tag| {
        if tag == "Pamb" {
            String::new()
        } else {
            tag.replace(".junk", "")
        }
    });
    assert_eq!(table.tags().collect::<Vec<_>>(), vec!["T", "P"]);
}

#[test]
fn test_rename_with_suffix_mapper() {
    let mut table = sample_table();
    table.rename_tags(&crate::common::retag);
    assert_eq!(table.tags().collect::<Vec<_>>(), vec!["T", "P", "Pamb"]);
}

#[test]
fn test_meta_table_order_and_mutation() {
    let mut meta = MetaTable::default();
    for (tag, units) in [("T", "degF"), ("P", "psig"), ("V", "ft^3")] {
        let mut entry = TagMeta::new(tag);
        entry.units = units.to_string();
        meta.push(entry);
    }
    assert_eq!(meta.len(), 3);
    assert_eq!(meta.iter().map(|e| e.tag.as_str()).collect::<Vec<_>>(), vec!["T", "P", "V"]);

    meta.get_mut("P").unwrap().units = "kilogram / meter / second ** 2".to_string();
    assert_eq!(meta.get("P").unwrap().units, "kilogram / meter / second ** 2");
    assert!(meta.get("X").is_none());
}

#[test]
fn test_meta_rename_drops_empty() {
    let mut meta = MetaTable::default();
    meta.push(TagMeta::new("T.junk"));
    meta.push(TagMeta::new("SCRAP"));
    meta.rename_tags(&|tag| if tag == "SCRAP" { String::new() } else { tag.replace(".junk", "") });
    assert!(meta.contains_tag("T"));
    assert!(!meta.contains_tag("SCRAP"));
    assert_eq!(meta.len(), 1);
}

#[test]
fn test_table_serializes_to_json() {
    let mut table = SeriesTable::new(vec!["12:00".to_string()]);
    table.push_column("T", vec![300.0]);
    let json = serde_json::to_string(&table).unwrap();
    assert!(json.contains("\"index\""));
    assert!(json.contains("\"tag\":\"T\""));
}
