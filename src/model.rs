use serde::{Deserialize, Serialize};

/// One node of the document outline, flattened in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub doc_title: Option<String>,
    pub section_id: String,
    pub title: String,
    pub page: u32,
    pub level: u32,
    pub parent_id: Option<String>,
    pub full_path: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

impl TocEntry {
    pub fn top_level(section_id: &str, title: &str, page: u32) -> Self {
        Self {
            doc_title: None,
            section_id: section_id.to_string(),
            title: title.to_string(),
            page,
            level: 1,
            parent_id: None,
            full_path: format!("{} {}", section_id, title),
            tags: Vec::new(),
        }
    }
}

/// A contiguous page range of the document and the text extracted from it.
///
/// The range `page_start..=page_end` is empty when `page_end < page_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub section_id: String,
    pub title: String,
    #[serde(alias = "page")]
    pub page_start: u32,
    pub page_end: u32,
    pub level: u32,
    pub parent_id: Option<String>,
    pub full_path: String,
    #[serde(alias = "text")]
    pub content: String,
}

impl SectionEntry {
    pub fn page_count(&self) -> u32 {
        if self.page_end < self.page_start {
            0
        } else {
            self.page_end - self.page_start + 1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub toc_count: usize,
    pub parsed_count: usize,
    pub missing_in_parsed: usize,
    pub missing_in_toc: usize,
    pub coverage: f64,
    #[serde(default)]
    pub missing_in_parsed_ids: Vec<String>,
    #[serde(default)]
    pub missing_in_toc_ids: Vec<String>,
}

impl ValidationReport {
    /// Rows for the metric/value spreadsheet.
    pub fn metric_rows(&self) -> Vec<(String, serde_json::Value)> {
        vec![
            ("toc_count".to_string(), self.toc_count.into()),
            ("parsed_count".to_string(), self.parsed_count.into()),
            ("missing_in_parsed".to_string(), self.missing_in_parsed.into()),
            ("missing_in_toc".to_string(), self.missing_in_toc.into()),
            ("coverage".to_string(), self.coverage.into()),
        ]
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TocMode {
    /// Entries came from the document outline.
    Outline,
    /// The document had no outline; a single synthetic entry stands in.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunPaths {
    pub output_dir: String,
    pub toc_jsonl: String,
    pub toc_xlsx: String,
    pub sections_jsonl: String,
    pub sections_xlsx: String,
    pub report_xlsx: String,
    pub report_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunCounts {
    pub page_count: u32,
    pub toc_entries: usize,
    pub sections: usize,
    pub empty_sections: usize,
    pub empty_ranges: usize,
    pub failed_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub document_path: String,
    pub document_sha256: String,
    pub document_title: Option<String>,
    pub toc_mode: TocMode,
    pub section_strategy: String,
    pub paths: RunPaths,
    pub counts: RunCounts,
    pub coverage: f64,
    pub warnings: Vec<String>,
}
