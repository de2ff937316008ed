use anyhow::Result;
use tracing::info;

use crate::cli::ExtractArgs;
use crate::config::PipelineConfig;
use crate::extract::{SectionExtraction, extract_sections, extract_toc};
use crate::output::{write_jsonl, write_records_xlsx};
use crate::util::ensure_directory;

pub fn run(args: ExtractArgs) -> Result<()> {
    let config = PipelineConfig::from(args);
    ensure_directory(&config.output_dir)?;

    let toc = extract_toc(&config.document_path)?;
    let sections = extract_sections(&config.document_path, &toc, config.strategy)?;
    write_section_outputs(&config, &sections)?;

    info!(
        sections = sections.sections.len(),
        strategy = sections.strategy.as_str(),
        "sections command completed"
    );
    Ok(())
}

pub fn write_section_outputs(config: &PipelineConfig, sections: &SectionExtraction) -> Result<()> {
    write_jsonl(
        &config.artifact_path(&config.artifacts.sections_jsonl),
        &sections.sections,
    )?;
    write_records_xlsx(
        &config.artifact_path(&config.artifacts.sections_xlsx),
        &sections.sections,
    )?;
    Ok(())
}
