use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::document::{OutlineNode, PdfDocument};
use crate::model::{TocEntry, TocMode};
use crate::util::normalize_whitespace;

const FALLBACK_SECTION_ID: &str = "1";
const FALLBACK_TITLE: &str = "Introduction";
const UNTITLED: &str = "Untitled section";

#[derive(Debug, Clone)]
pub struct TocExtraction {
    pub entries: Vec<TocEntry>,
    pub mode: TocMode,
    pub document_title: Option<String>,
    pub warnings: Vec<String>,
}

/// Opens the document, reads its outline and closes it again.
pub fn extract_toc(pdf_path: &Path) -> Result<TocExtraction> {
    let document = PdfDocument::open(pdf_path)?;
    let outline = document.outline();
    let document_title = document.title();
    drop(document);

    let parser = HeadingParser::new()?;
    let extraction = toc_from_outline(&outline, document_title, &parser);

    info!(
        path = %pdf_path.display(),
        entries = extraction.entries.len(),
        mode = ?extraction.mode,
        "extracted table of contents"
    );

    Ok(extraction)
}

/// Flattens the outline in pre-order. An empty outline yields the single
/// synthetic fallback entry and `TocMode::Fallback`.
pub fn toc_from_outline(
    outline: &[OutlineNode],
    document_title: Option<String>,
    parser: &HeadingParser,
) -> TocExtraction {
    if outline.is_empty() {
        let message = format!(
            "document has no outline; using synthetic '{} {}' entry on page 1",
            FALLBACK_SECTION_ID, FALLBACK_TITLE
        );
        warn!("{}", message);

        let entry = TocEntry {
            doc_title: document_title.clone(),
            ..TocEntry::top_level(FALLBACK_SECTION_ID, FALLBACK_TITLE, 1)
        };
        return TocExtraction {
            entries: vec![entry],
            mode: TocMode::Fallback,
            document_title,
            warnings: vec![message],
        };
    }

    let mut reserved = HashSet::new();
    collect_explicit_ids(outline, parser, &mut reserved);

    let mut builder = TocBuilder {
        parser,
        document_title: document_title.clone(),
        entries: Vec::new(),
        reserved,
        id_counts: HashMap::new(),
        last_page: 1,
        warnings: Vec::new(),
    };
    builder.walk(outline, None, 1);

    TocExtraction {
        entries: builder.entries,
        mode: TocMode::Outline,
        document_title,
        warnings: builder.warnings,
    }
}

/// Every section number the outline states explicitly, at any depth.
fn collect_explicit_ids(
    nodes: &[OutlineNode],
    parser: &HeadingParser,
    ids: &mut HashSet<String>,
) {
    for node in nodes {
        if let Some(id) = parser.parse(&normalize_whitespace(&node.title)).section_id {
            ids.insert(id);
        }
        collect_explicit_ids(&node.children, parser, ids);
    }
}

/// Splits explicit numbering off outline titles.
pub struct HeadingParser {
    numbered: Regex,
    annex: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeading {
    pub section_id: Option<String>,
    pub title: String,
    /// Whether the title already names the section, as in `Annex A ...`.
    pub title_carries_id: bool,
}

impl HeadingParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numbered: Regex::new(r"^(\d{1,3}(?:\.\d+)*)\.?\s+(\S.*)$")
                .context("failed to compile numbered heading regex")?,
            annex: Regex::new(r"^(?i:annex|appendix)\s+([A-Z](?:\.\d+)*)\b")
                .context("failed to compile annex heading regex")?,
        })
    }

    pub fn parse(&self, normalized_title: &str) -> ParsedHeading {
        if let Some(captures) = self.numbered.captures(normalized_title) {
            let section_id = captures.get(1).map(|value| value.as_str().to_string());
            let title = captures
                .get(2)
                .map(|value| value.as_str().trim().to_string())
                .unwrap_or_default();
            return ParsedHeading {
                section_id,
                title,
                title_carries_id: false,
            };
        }

        if let Some(captures) = self.annex.captures(normalized_title) {
            return ParsedHeading {
                section_id: captures.get(1).map(|value| value.as_str().to_string()),
                title: normalized_title.to_string(),
                title_carries_id: true,
            };
        }

        ParsedHeading {
            section_id: None,
            title: normalized_title.to_string(),
            title_carries_id: false,
        }
    }
}

struct ParentRef {
    section_id: String,
    full_path: String,
}

struct TocBuilder<'a> {
    parser: &'a HeadingParser,
    document_title: Option<String>,
    entries: Vec<TocEntry>,
    /// Explicit numbers synthesized ids must stay clear of.
    reserved: HashSet<String>,
    id_counts: HashMap<String, usize>,
    last_page: u32,
    warnings: Vec<String>,
}

impl TocBuilder<'_> {
    fn walk(&mut self, nodes: &[OutlineNode], parent: Option<&ParentRef>, level: u32) {
        for (ordinal, node) in nodes.iter().enumerate() {
            let normalized = normalize_whitespace(&node.title);
            let heading = if normalized.is_empty() {
                ParsedHeading {
                    section_id: None,
                    title: UNTITLED.to_string(),
                    title_carries_id: false,
                }
            } else {
                self.parser.parse(&normalized)
            };

            let base_id = match heading.section_id.clone() {
                Some(explicit) => explicit,
                None => self.ordinal_id(parent, ordinal + 1),
            };
            let section_id = self.unique_id(base_id);

            let page = match node.page {
                Some(page) if page >= 1 => page,
                _ => {
                    let message = format!(
                        "outline item '{}' has no resolvable destination; using page {}",
                        heading.title, self.last_page
                    );
                    warn!("{}", message);
                    self.warnings.push(message);
                    self.last_page
                }
            };
            self.last_page = page;

            let label = if heading.title_carries_id {
                heading.title.clone()
            } else {
                format!("{} {}", section_id, heading.title)
            };
            let full_path = match parent {
                Some(parent) => format!("{} > {}", parent.full_path, label),
                None => label,
            };

            self.entries.push(TocEntry {
                doc_title: self.document_title.clone(),
                section_id: section_id.clone(),
                title: heading.title,
                page,
                level,
                parent_id: parent.map(|parent| parent.section_id.clone()),
                full_path: full_path.clone(),
                tags: Vec::new(),
            });

            if !node.children.is_empty() {
                let current = ParentRef {
                    section_id,
                    full_path,
                };
                self.walk(&node.children, Some(&current), level + 1);
            }
        }
    }

    /// `parent.N`, or `N` at the top level. An ordinal that would shadow an
    /// explicit number gets a `u` prefix.
    fn ordinal_id(&self, parent: Option<&ParentRef>, ordinal: usize) -> String {
        let id = match parent {
            Some(parent) => format!("{}.{}", parent.section_id, ordinal),
            None => ordinal.to_string(),
        };
        if self.reserved.contains(&id) {
            format!("u{}", id)
        } else {
            id
        }
    }

    fn unique_id(&mut self, base_id: String) -> String {
        let count = self.id_counts.entry(base_id.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return base_id;
        }

        let mut suffix = *count;
        let mut candidate = format!("{}-{}", base_id, suffix);
        while self.id_counts.contains_key(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", base_id, suffix);
        }
        self.id_counts.insert(candidate.clone(), 1);

        let message = format!(
            "duplicate section id '{}' renamed to '{}'",
            base_id, candidate
        );
        warn!("{}", message);
        self.warnings.push(message);
        candidate
    }
}
