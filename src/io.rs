//! CSV adapters for observed and generated inventories.
//!
//! Input: a header row, then one row per segment occurrence. Two columns
//! (selected by index) hold the language name and the segment label; columns
//! from `skip_columns` onwards are features. Rows sharing a language name form
//! one observed inventory.
//!
//! Output: `language,label,<features...>`, one row per generated item, feature
//! cells written as `1` / `-1`.

use crate::batch::Inventory;
use crate::config::InputLayout;
use crate::error::{Result, SynthError};
use crate::feature::{Feature, FeatureVector};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// One segment occurrence in an observed inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedSegment {
    pub label: String,
    pub features: FeatureVector,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedInventory {
    pub name: String,
    pub segments: Vec<ObservedSegment>,
}

impl ObservedInventory {
    pub fn size(&self) -> usize {
        self.segments.len()
    }
}

/// Parsed input file: feature names plus inventories in first-appearance
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObservedData {
    pub feature_names: Vec<String>,
    pub inventories: Vec<ObservedInventory>,
}

impl ObservedData {
    pub fn arity(&self) -> usize {
        self.feature_names.len()
    }
}

/// Read observed inventories from a CSV file.
pub fn read_inventories(path: &Path, layout: &InputLayout) -> Result<ObservedData> {
    let file = fs::File::open(path)?;
    let data = parse_inventories(file, path, layout)?;
    debug!(
        path = %path.display(),
        inventories = data.inventories.len(),
        features = data.arity(),
        "read observed inventories"
    );
    Ok(data)
}

/// Parse observed inventories from any reader; `path` is only used in error
/// messages.
pub fn parse_inventories<R: std::io::Read>(
    reader: R,
    path: &Path,
    layout: &InputLayout,
) -> Result<ObservedData> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = csv.headers()?.clone();
    let width = header.len();
    for (what, index) in [
        ("language column", layout.language_column),
        ("segment column", layout.segment_column),
    ] {
        if index >= width {
            return Err(SynthError::malformed(
                path,
                1,
                format!("{what} {index} is outside the {width}-column header"),
            ));
        }
    }
    if layout.skip_columns > width {
        return Err(SynthError::malformed(
            path,
            1,
            format!("cannot skip {} columns of a {width}-column header", layout.skip_columns),
        ));
    }

    let feature_names: Vec<String> = header
        .iter()
        .skip(layout.skip_columns)
        .map(|s| s.trim().to_string())
        .collect();

    let mut inventories: Vec<ObservedInventory> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for record in csv.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != width {
            return Err(SynthError::malformed(
                path,
                line,
                format!("expected {width} fields, found {}", record.len()),
            ));
        }

        let features = record
            .iter()
            .skip(layout.skip_columns)
            .map(|cell| {
                Feature::parse_cell(cell).ok_or_else(|| {
                    SynthError::malformed(path, line, format!("bad feature value {cell:?}"))
                })
            })
            .collect::<Result<FeatureVector>>()?;

        let language = record[layout.language_column].trim().to_string();
        let segment = ObservedSegment {
            label: record[layout.segment_column].trim().to_string(),
            features,
        };

        let index = *by_name.entry(language.clone()).or_insert_with(|| {
            inventories.push(ObservedInventory {
                name: language,
                segments: Vec::new(),
            });
            inventories.len() - 1
        });
        inventories[index].segments.push(segment);
    }

    Ok(ObservedData {
        feature_names,
        inventories,
    })
}

/// Header row of a generated-inventory file.
pub fn inventory_columns(feature_names: &[String]) -> Vec<String> {
    let mut cols = vec!["language".to_string(), "label".to_string()];
    cols.extend(feature_names.iter().cloned());
    cols
}

/// Write generated inventories to `path`.
///
/// Missing parent directories are created. The file is written beside its
/// destination and renamed into place, so the final path only ever holds a
/// complete file.
pub fn write_inventories(path: &Path, inventories: &[Inventory], feature_names: &[String]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    write_inventories_to(&mut tmp, inventories, feature_names)?;
    tmp.flush()?;
    tmp.persist(path)?;

    debug!(path = %path.display(), inventories = inventories.len(), "wrote inventories");
    Ok(())
}

/// Write generated inventories as CSV to any writer.
pub fn write_inventories_to<W: Write>(
    writer: W,
    inventories: &[Inventory],
    feature_names: &[String],
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(inventory_columns(feature_names))?;

    for inventory in inventories {
        for (label, row) in inventory.item_names.iter().zip(&inventory.rows) {
            let mut record = Vec::with_capacity(2 + row.len());
            record.push(inventory.name.clone());
            record.push(label.clone());
            record.extend(row.iter().map(|v| v.to_string()));
            csv.write_record(&record)?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// File name of `path` without directory or extension.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
