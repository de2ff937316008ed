mod sections;
mod toc;

pub use sections::{SectionExtraction, extract_sections};
pub use toc::{TocExtraction, extract_toc};

#[cfg(test)]
use sections::{page_ranges, resolve_strategy, sections_from_source};
#[cfg(test)]
use toc::{HeadingParser, toc_from_outline};
