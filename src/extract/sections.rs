use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::SectionStrategy;
use crate::document::{PageSource, PdfDocument};
use crate::model::{SectionEntry, TocEntry, TocMode};

use super::toc::TocExtraction;

#[derive(Debug, Clone)]
pub struct SectionExtraction {
    pub sections: Vec<SectionEntry>,
    /// The strategy actually used; never `Auto`.
    pub strategy: SectionStrategy,
    pub page_count: u32,
    pub failed_pages: Vec<u32>,
    pub warnings: Vec<String>,
}

impl SectionExtraction {
    pub fn empty_section_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|section| section.content.is_empty())
            .count()
    }

    /// Sections whose page range holds no pages at all.
    pub fn empty_range_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|section| section.page_count() == 0)
            .count()
    }
}

/// `Auto` picks TOC-driven extraction only when the TOC came from a real outline.
pub fn resolve_strategy(requested: SectionStrategy, toc: &TocExtraction) -> Result<SectionStrategy> {
    match requested {
        SectionStrategy::Auto => {
            if toc.mode == TocMode::Outline && !toc.entries.is_empty() {
                Ok(SectionStrategy::Toc)
            } else {
                Ok(SectionStrategy::Pages)
            }
        }
        SectionStrategy::Toc => {
            if toc.entries.is_empty() {
                bail!("TOC-driven section extraction requires a non-empty table of contents");
            }
            Ok(SectionStrategy::Toc)
        }
        SectionStrategy::Pages => Ok(SectionStrategy::Pages),
    }
}

/// Opens the document again and derives sections with the resolved strategy.
pub fn extract_sections(
    pdf_path: &Path,
    toc: &TocExtraction,
    requested: SectionStrategy,
) -> Result<SectionExtraction> {
    let strategy = resolve_strategy(requested, toc)?;
    let document = PdfDocument::open(pdf_path)?;
    let extraction = sections_from_source(&document, &toc.entries, strategy);

    info!(
        path = %document.path().display(),
        strategy = strategy.as_str(),
        sections = extraction.sections.len(),
        failed_pages = extraction.failed_pages.len(),
        "extracted sections"
    );

    Ok(extraction)
}

pub fn sections_from_source<S: PageSource + ?Sized>(
    source: &S,
    toc: &[TocEntry],
    strategy: SectionStrategy,
) -> SectionExtraction {
    let page_count = source.page_count();
    let mut reader = PageReader::new(source);

    let sections = match strategy {
        SectionStrategy::Pages => sections_by_page(&mut reader),
        SectionStrategy::Toc | SectionStrategy::Auto => sections_by_toc(&mut reader, toc),
    };

    SectionExtraction {
        sections,
        strategy: match strategy {
            SectionStrategy::Auto => SectionStrategy::Toc,
            other => other,
        },
        page_count,
        failed_pages: reader.failed_pages,
        warnings: reader.warnings,
    }
}

/// Inclusive `(start, end)` page range for every TOC entry: each section runs
/// up to the page before the next entry starts, the last one to the final
/// page. Ends are clamped to `page_count`; `end < start` means empty.
pub fn page_ranges(toc: &[TocEntry], page_count: u32) -> Vec<(u32, u32)> {
    toc.iter()
        .enumerate()
        .map(|(index, entry)| {
            let end = toc
                .get(index + 1)
                .map(|next| next.page.saturating_sub(1))
                .unwrap_or(page_count);
            (entry.page, end.min(page_count))
        })
        .collect()
}

fn sections_by_toc<S: PageSource + ?Sized>(
    reader: &mut PageReader<'_, S>,
    toc: &[TocEntry],
) -> Vec<SectionEntry> {
    let page_count = reader.source.page_count();
    let ranges = page_ranges(toc, page_count);

    for pair in toc.windows(2) {
        if pair[1].page < pair[0].page {
            reader.warn(format!(
                "outline is out of page order: '{}' (page {}) follows '{}' (page {})",
                pair[1].section_id, pair[1].page, pair[0].section_id, pair[0].page
            ));
        }
    }

    toc.iter()
        .zip(ranges)
        .map(|(entry, (start, end))| {
            if start > page_count {
                reader.warn(format!(
                    "section '{}' starts on page {} beyond the last page {}; content left empty",
                    entry.section_id, start, page_count
                ));
            }

            let content = (start..=end)
                .map(|page| reader.read(page))
                .collect::<Vec<String>>()
                .join("\n")
                .trim()
                .to_string();

            SectionEntry {
                section_id: entry.section_id.clone(),
                title: entry.title.clone(),
                page_start: start,
                page_end: end,
                level: entry.level,
                parent_id: entry.parent_id.clone(),
                full_path: entry.full_path.clone(),
                content,
            }
        })
        .collect()
}

fn sections_by_page<S: PageSource + ?Sized>(reader: &mut PageReader<'_, S>) -> Vec<SectionEntry> {
    (1..=reader.source.page_count())
        .map(|page| SectionEntry {
            section_id: page.to_string(),
            title: format!("Page {}", page),
            page_start: page,
            page_end: page,
            level: 1,
            parent_id: None,
            full_path: format!("Page {}", page),
            content: reader.read(page).trim().to_string(),
        })
        .collect()
}

/// Reads page text, absorbing per-page failures as empty text.
struct PageReader<'a, S: PageSource + ?Sized> {
    source: &'a S,
    failed_pages: Vec<u32>,
    warnings: Vec<String>,
}

impl<'a, S: PageSource + ?Sized> PageReader<'a, S> {
    fn new(source: &'a S) -> Self {
        Self {
            source,
            failed_pages: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn read(&mut self, page: u32) -> String {
        match self.source.page_text(page) {
            Ok(text) => text,
            Err(err) => {
                self.failed_pages.push(page);
                self.warn(format!("{}; using empty text", err));
                String::new()
            }
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}
