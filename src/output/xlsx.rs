//! Minimal single-sheet SpreadsheetML writer.
//!
//! Strings are written as inline strings, so the package needs no shared
//! string table or styles part.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tracing::warn;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::{Cell, Table};
use crate::error::ExtractError;
use crate::util::ensure_parent_directory;

/// Excel rejects cells longer than this many characters.
pub const MAX_CELL_CHARS: usize = 32_767;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

pub fn write_sheet(path: &Path, sheet_name: &str, table: &Table) -> Result<()> {
    ensure_parent_directory(path)?;

    let workbook = render_workbook(sheet_name);
    let worksheet = render_worksheet(table);
    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", &worksheet),
    ];

    let file = File::create(path).map_err(|source| ExtractError::write(path, source))?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, body) in parts {
        archive
            .start_file(name, options)
            .map_err(std::io::Error::other)
            .and_then(|()| archive.write_all(body.as_bytes()))
            .map_err(|source| ExtractError::write(path, source))?;
    }
    archive
        .finish()
        .map_err(|err| ExtractError::write(path, std::io::Error::other(err)))?;

    Ok(())
}

fn render_workbook(sheet_name: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        ),
        escape_xml(sheet_name)
    )
}

fn render_worksheet(table: &Table) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#
    ));

    let header_cells = table
        .headers
        .iter()
        .map(|header| Cell::Text(header.clone()))
        .collect::<Vec<Cell>>();
    push_row(&mut xml, 1, &header_cells);
    for (index, row) in table.rows.iter().enumerate() {
        push_row(&mut xml, index + 2, row);
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, row_number: usize, cells: &[Cell]) {
    xml.push_str(&format!(r#"<row r="{}">"#, row_number));
    for (column, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_name(column), row_number);
        match cell {
            Cell::Empty => {}
            Cell::Number(value) => {
                xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value));
            }
            Cell::Text(text) => {
                xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    escape_xml(truncate_cell(text, &reference))
                ));
            }
        }
    }
    xml.push_str("</row>");
}

fn truncate_cell<'a>(text: &'a str, reference: &str) -> &'a str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(
                cell = reference,
                chars = text.chars().count(),
                limit = MAX_CELL_CHARS,
                "cell text truncated to spreadsheet limit"
            );
            &text[..cut]
        }
        None => text,
    }
}

/// Zero-based column index to spreadsheet letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Escapes markup characters and drops control characters XML 1.0 forbids.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(ch),
            ch if (ch as u32) < 0x20 || ch == '\u{FFFE}' || ch == '\u{FFFF}' => {}
            ch => out.push(ch),
        }
    }
    out
}
