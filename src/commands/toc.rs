use anyhow::{Context, Result};
use tracing::info;

use crate::cli::TocArgs;
use crate::config::PipelineConfig;
use crate::extract::{TocExtraction, extract_toc};
use crate::output::{write_jsonl, write_records_xlsx};
use crate::schema::validate_toc;
use crate::util::ensure_directory;

pub fn run(args: TocArgs) -> Result<()> {
    let config = PipelineConfig::from(args);
    ensure_directory(&config.output_dir)?;

    let toc = extract_toc(&config.document_path)?;
    write_toc_outputs(&config, &toc)?;

    info!(entries = toc.entries.len(), "toc command completed");
    Ok(())
}

/// Schema-checks the entries, then writes the TOC JSON-lines and spreadsheet.
pub fn write_toc_outputs(config: &PipelineConfig, toc: &TocExtraction) -> Result<()> {
    validate_toc(&toc.entries).context("table of contents failed schema validation")?;

    write_jsonl(
        &config.artifact_path(&config.artifacts.toc_jsonl),
        &toc.entries,
    )?;
    write_records_xlsx(
        &config.artifact_path(&config.artifacts.toc_xlsx),
        &toc.entries,
    )?;
    Ok(())
}
