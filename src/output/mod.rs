use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::util::ensure_parent_directory;

mod xlsx;

pub use xlsx::write_sheet;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone)]
pub struct JsonlLoad<T> {
    pub records: Vec<T>,
    pub skipped_lines: usize,
}

/// Writes one compact JSON object per line. Non-ASCII text is kept as-is.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent_directory(path)?;

    let file = File::create(path).map_err(|source| ExtractError::write(path, source))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        let line = serde_json::to_string(record)
            .with_context(|| format!("failed to serialize record for {}", path.display()))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|source| ExtractError::write(path, source))?;
    }
    writer
        .flush()
        .map_err(|source| ExtractError::write(path, source))?;

    info!(path = %path.display(), records = records.len(), "wrote jsonl");
    Ok(())
}

/// Loads a JSON-lines file. Lines that do not parse, invalid UTF-8 included,
/// are dropped; a missing file loads as empty.
pub fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Result<JsonlLoad<T>> {
    if !path.exists() {
        warn!(path = %path.display(), "jsonl file missing; treating as empty");
        return Ok(JsonlLoad {
            records: Vec::new(),
            skipped_lines: 0,
        });
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut records = Vec::new();
    let mut skipped_lines = 0;
    for (index, line) in raw.split(|byte| *byte == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<T>(line) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped_lines += 1;
                debug!(
                    path = %path.display(),
                    line = index + 1,
                    error = %err,
                    "skipping unparseable jsonl line"
                );
            }
        }
    }

    Ok(JsonlLoad {
        records,
        skipped_lines,
    })
}

/// Header row is the union of record keys in first-seen order.
pub fn records_to_table<T: Serialize>(records: &[T]) -> Result<Table> {
    let mut objects = Vec::<Map<String, Value>>::with_capacity(records.len());
    for record in records {
        match serde_json::to_value(record).context("failed to convert record to json")? {
            Value::Object(map) => objects.push(map),
            other => bail!("spreadsheet rows must be json objects, found {}", other),
        }
    }

    let mut headers = Vec::<String>::new();
    for object in &objects {
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            headers
                .iter()
                .map(|header| cell_from_value(object.get(header)))
                .collect::<Vec<Cell>>()
        })
        .collect();

    Ok(Table { headers, rows })
}

pub fn write_records_xlsx<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let table = records_to_table(records)?;
    write_sheet(path, DEFAULT_SHEET_NAME, &table)?;
    info!(path = %path.display(), rows = table.rows.len(), "wrote spreadsheet");
    Ok(())
}

/// Two-column `metric`/`value` sheet.
pub fn write_key_value_xlsx(path: &Path, rows: &[(String, Value)]) -> Result<()> {
    let table = Table {
        headers: vec!["metric".to_string(), "value".to_string()],
        rows: rows
            .iter()
            .map(|(key, value)| vec![Cell::Text(key.clone()), cell_from_value(Some(value))])
            .collect(),
    };
    write_sheet(path, DEFAULT_SHEET_NAME, &table)?;
    info!(path = %path.display(), rows = table.rows.len(), "wrote key/value spreadsheet");
    Ok(())
}

fn cell_from_value(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => Cell::Empty,
        Some(Value::Number(number)) => number
            .as_f64()
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::Text(number.to_string())),
        Some(Value::String(text)) => Cell::Text(text.clone()),
        Some(Value::Bool(flag)) => Cell::Text(flag.to_string()),
        Some(Value::Array(items)) => Cell::Text(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<String>>()
                .join(", "),
        ),
        Some(object @ Value::Object(_)) => Cell::Text(object.to_string()),
    }
}
