//! Reading a data/metadata pair and mapping tags onto the demo model.

use std::io::Write;

use plantlog::{read_data, ReadError, ReadOptions, UnitSystem};

use crate::common::{retag, DemoModel, PLANT1_DATA, PLANT1_META};

fn assert_close(actual: f64, expected: f64, rel: f64) {
    assert!(
        (actual - expected).abs() <= rel * expected.abs(),
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_map_data() {
    let model = DemoModel::new();
    let opts = ReadOptions::default()
        .model(&model)
        .rename_mapper(&retag)
        .unit_system(UnitSystem::Mks);
    let (df, df_meta) = read_data(PLANT1_DATA, PLANT1_META, &opts).unwrap();

    // Expected columns in data and metadata after renaming
    for tag in ["T", "P", "V"] {
        assert!(df.contains_tag(tag), "data is missing {tag}");
        assert!(df_meta.contains_tag(tag), "metadata is missing {tag}");
    }

    // Unit strings updated after conversion
    assert_eq!(df_meta.get("T").unwrap().units, "kelvin");
    // this next unit is Pa
    assert_eq!(df_meta.get("P").unwrap().units, "kilogram / meter / second ** 2");
    assert_eq!(df_meta.get("V").unwrap().units, "meter ** 3");

    // Converted values at the first timestamp
    assert_close(df.value("T", "1901-3-3 12:00").unwrap(), 300.0, 1e-4);
    assert_close(df.value("P", "1901-3-3 12:00").unwrap(), 200_000.0, 1e-4);
    assert_close(df.value("V", "1901-3-3 12:00").unwrap(), 5.187_873, 1e-4);

    // Tags map onto the model variables (key 1 is the first point of the
    // model's time set, because the references are time-indexed)
    let t_ref = df_meta.get("T").unwrap().reference.as_ref().unwrap();
    let p_ref = df_meta.get("P").unwrap().reference.as_ref().unwrap();
    let v_ref = df_meta.get("V").unwrap().reference.as_ref().unwrap();
    assert_close(t_ref.value(1).unwrap(), 300.0, 1e-4);
    assert_close(p_ref.value(1).unwrap(), 101_325.0, 1e-4);
    assert_close(v_ref.value(1).unwrap(), 10.0, 1e-4);
}

#[test]
fn test_map_data_use_ambient_pressure() {
    let model = DemoModel::new();
    let opts = ReadOptions::default()
        .model(&model)
        .rename_mapper(&retag)
        .unit_system(UnitSystem::Mks)
        .ambient_tag("Pamb")
        .ambient_pressure_unit("psi");
    let (df, _df_meta) = read_data(PLANT1_DATA, PLANT1_META, &opts).unwrap();

    // Gauge column shifted by the measured ambient instead of 1 atm
    assert_close(df.value("P", "1901-3-3 12:00").unwrap(), 195_891.09, 1e-4);
}

#[test]
fn test_unmatched_and_unknown_units_pass_through() {
    let model = DemoModel::new();
    let opts = ReadOptions::default()
        .model(&model)
        .rename_mapper(&retag)
        .unit_system(UnitSystem::Mks);
    let (df, df_meta) = read_data(PLANT1_DATA, PLANT1_META, &opts).unwrap();

    // A column with no metadata row is kept unconverted
    assert!(df.contains_tag("Extra"));
    assert_eq!(df.value("Extra", "1901-3-3 12:00"), Some(1.0));
    assert!(df_meta.get("Extra").is_none());

    // A metadata row with an unknown unit keeps its label and values
    assert_eq!(df_meta.get("A").unwrap().units, "WIDGET");
    assert_eq!(df.value("A", "1901-3-3 12:00"), Some(42.0));

    // The ambient column itself converts like any other metadata-backed tag
    assert_close(df.value("Pamb", "1901-3-3 12:00").unwrap(), 14.1 * 6_894.757, 1e-4);
    assert!(df_meta.get("A").unwrap().reference.is_none());
}

#[test]
fn test_reading_without_model_or_system() {
    let opts = ReadOptions::default().rename_mapper(&retag);
    let (df, df_meta) = read_data(PLANT1_DATA, PLANT1_META, &opts).unwrap();

    assert_eq!(df_meta.get("T").unwrap().units, "DEG F");
    assert_close(df.value("T", "1901-3-3 12:00").unwrap(), 80.33, 1e-9);
    assert!(df_meta.get("T").unwrap().reference.is_none());
}

#[test]
fn test_unknown_ambient_tag_is_an_error() {
    let opts = ReadOptions::default()
        .unit_system(UnitSystem::Mks)
        .ambient_tag("NotThere");
    let result = read_data(PLANT1_DATA, PLANT1_META, &opts);
    assert!(matches!(
        result,
        Err(ReadError::UnknownAmbientTag { tag }) if tag == "NotThere"
    ));
}

#[test]
fn test_missing_file_is_an_error() {
    let result = read_data("testdata/no_such.csv", PLANT1_META, &ReadOptions::default());
    assert!(matches!(result, Err(ReadError::Parse { .. })));
}

#[test]
fn test_rename_mapper_drops_tags() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data.csv");
    let meta_path = dir.path().join("meta.csv");
    let mut data = std::fs::File::create(&data_path).unwrap();
    writeln!(data, "timestamp,KEEP.raw,SCRAP.raw").unwrap();
    writeln!(data, "12:00,1.5,9.9").unwrap();
    let mut meta = std::fs::File::create(&meta_path).unwrap();
    writeln!(meta, "KEEP.raw,kept tag,kPa,").unwrap();
    writeln!(meta, "SCRAP.raw,dropped tag,kPa,").unwrap();

    let mapper = |tag: &str| {
        if tag.starts_with("SCRAP") {
            String::new()
        } else {
            tag.replace(".raw", "")
        }
    };
    let opts = ReadOptions::default().rename_mapper(&mapper).unit_system(UnitSystem::Mks);
    let (df, df_meta) = read_data(&data_path, &meta_path, &opts).unwrap();

    assert!(df.contains_tag("KEEP"));
    assert!(!df.contains_tag("SCRAP"));
    assert!(!df.contains_tag("SCRAP.raw"));
    assert!(df_meta.get("SCRAP.raw").is_none());
    assert_close(df.value("KEEP", "12:00").unwrap(), 1500.0, 1e-9);
    assert_eq!(df_meta.get("KEEP").unwrap().units, "kilogram / meter / second ** 2");
}
