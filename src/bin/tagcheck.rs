//! Command-line inspector for historian data/metadata file pairs.
//!
//! Loads a data file and its metadata file, optionally converts to a unit
//! system, and prints a per-tag summary. Useful for checking a historian
//! export before wiring it to a model.

use anyhow::{bail, Context, Result};

use plantlog::{read_data, ReadOptions, UnitSystem};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 || args.len() > 3 {
        bail!("usage: tagcheck <data-file> <metadata-file> [unit-system]");
    }

    let mut opts = ReadOptions::default();
    if let Some(name) = args.get(2) {
        let system: UnitSystem = name
            .parse()
            .ok()
            .with_context(|| format!("unknown unit system '{name}'"))?;
        opts = opts.unit_system(system);
    }

    let (table, meta) = read_data(&args[0], &args[1], &opts)
        .with_context(|| format!("failed to read {} / {}", args[0], args[1]))?;

    println!("{} rows, {} tags", table.len(), table.tags().count());
    for entry in meta.iter() {
        let summary = match table.column(&entry.tag) {
            Some(values) => {
                let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
                match (finite.first(), finite.last()) {
                    (Some(first), Some(last)) => {
                        format!("{} values, first {:.4}, last {:.4}", finite.len(), first, last)
                    }
                    _ => "no numeric values".to_string(),
                }
            }
            None => "no data column".to_string(),
        };
        println!("  {:<20} [{}] {}", entry.tag, entry.units, summary);
    }

    let unmatched: Vec<&str> =
        table.tags().filter(|tag| meta.get(tag).is_none() && !tag.is_empty()).collect();
    if !unmatched.is_empty() {
        println!("columns without metadata: {}", unmatched.join(", "));
    }

    Ok(())
}
