use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::cli::ExtractArgs;
use crate::commands::sections::write_section_outputs;
use crate::commands::toc::write_toc_outputs;
use crate::config::{PipelineConfig, ValidateConfig};
use crate::extract::{extract_sections, extract_toc};
use crate::model::{RunCounts, RunManifest, RunPaths, ValidationReport};
use crate::reconcile::validate_outputs;
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

pub fn run(args: ExtractArgs) -> Result<()> {
    let config = PipelineConfig::from(args);
    let report = run_pipeline(&config)?;

    let coverage = format!("{:.2}%", report.coverage);
    info!(
        output_dir = %config.output_dir.display(),
        coverage = %coverage,
        "all outputs saved"
    );
    Ok(())
}

/// Extract, write, reconcile, then record the run manifest. A failing step
/// aborts the run and leaves earlier outputs on disk.
pub fn run_pipeline(config: &PipelineConfig) -> Result<ValidationReport> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    info!(
        document = %config.document_path.display(),
        output_dir = %config.output_dir.display(),
        run_id = %run_id,
        "starting extraction"
    );
    ensure_directory(&config.output_dir)?;

    let toc = extract_toc(&config.document_path)?;
    let sections = extract_sections(&config.document_path, &toc, config.strategy)?;

    info!(toc_entries = toc.entries.len(), "TOC sections extracted");
    info!(
        sections = sections.sections.len(),
        "parsed sections with content"
    );

    write_toc_outputs(config, &toc)?;
    write_section_outputs(config, &sections)?;

    let report = validate_outputs(&ValidateConfig::from(config))?;

    let mut warnings = toc.warnings.clone();
    warnings.extend(sections.warnings.iter().cloned());

    let artifact = |name: &str| config.artifact_path(name).display().to_string();
    let manifest = RunManifest {
        manifest_version: 1,
        run_id,
        started_at,
        completed_at: now_utc_string(),
        document_path: config.document_path.display().to_string(),
        document_sha256: sha256_file(&config.document_path)?,
        document_title: toc.document_title.clone(),
        toc_mode: toc.mode,
        section_strategy: sections.strategy.as_str().to_string(),
        paths: RunPaths {
            output_dir: config.output_dir.display().to_string(),
            toc_jsonl: artifact(&config.artifacts.toc_jsonl),
            toc_xlsx: artifact(&config.artifacts.toc_xlsx),
            sections_jsonl: artifact(&config.artifacts.sections_jsonl),
            sections_xlsx: artifact(&config.artifacts.sections_xlsx),
            report_xlsx: artifact(&config.artifacts.report_xlsx),
            report_json: artifact(&config.artifacts.report_json),
        },
        counts: RunCounts {
            page_count: sections.page_count,
            toc_entries: toc.entries.len(),
            sections: sections.sections.len(),
            empty_sections: sections.empty_section_count(),
            empty_ranges: sections.empty_range_count(),
            failed_pages: sections.failed_pages.len(),
        },
        coverage: report.coverage,
        warnings,
    };

    let manifest_path = config.artifact_path(&config.artifacts.run_manifest);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;

    use super::*;
    use crate::cli::SectionStrategy;
    use crate::error::{EXIT_DOCUMENT_OPEN, exit_code_for};
    use crate::fixtures::{OutlineSpec, PdfFixture};
    use crate::model::{SectionEntry, TocEntry};
    use crate::output::load_jsonl;

    #[test]
    fn pipeline_writes_every_artifact_with_full_coverage() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let pdf = PdfFixture::new(&["Intro", "Intro cont", "Scope", "Scope cont", "Terms"])
            .outline(vec![
                OutlineSpec::page("1 Introduction", 1)
                    .with_children(vec![OutlineSpec::page("1.1 Purpose", 2)]),
                OutlineSpec::page("2 Scope", 3),
                OutlineSpec::page("3 Terms", 5),
            ])
            .title("USB Power Delivery")
            .write(temp.path());
        let config = PipelineConfig::new(&pdf, temp.path().join("out"));

        let report = run_pipeline(&config).expect("pipeline should succeed");
        assert_eq!(report.toc_count, 4);
        assert_eq!(report.parsed_count, 4);
        assert_eq!(report.coverage, 100.0);

        for name in [
            &config.artifacts.toc_jsonl,
            &config.artifacts.toc_xlsx,
            &config.artifacts.sections_jsonl,
            &config.artifacts.sections_xlsx,
            &config.artifacts.report_xlsx,
            &config.artifacts.report_json,
            &config.artifacts.run_manifest,
        ] {
            assert!(config.artifact_path(name).is_file(), "{} missing", name);
        }

        let toc = load_jsonl::<TocEntry>(&config.artifact_path(&config.artifacts.toc_jsonl))
            .expect("toc should load");
        assert_eq!(toc.records[1].full_path, "1 Introduction > 1.1 Purpose");
        assert_eq!(toc.records[1].doc_title.as_deref(), Some("USB Power Delivery"));

        let sections =
            load_jsonl::<SectionEntry>(&config.artifact_path(&config.artifacts.sections_jsonl))
                .expect("sections should load");
        assert_eq!(
            (sections.records[2].page_start, sections.records[2].page_end),
            (3, 4)
        );
        assert!(sections.records[2].content.contains("Scope cont"));

        let manifest: Value = serde_json::from_slice(
            &fs::read(config.artifact_path(&config.artifacts.run_manifest))
                .expect("manifest should exist"),
        )
        .expect("manifest should parse");
        assert_eq!(manifest["toc_mode"], "outline");
        assert_eq!(manifest["section_strategy"], "toc");
        assert_eq!(manifest["counts"]["page_count"], 5);
    }

    #[test]
    fn pipeline_without_outline_uses_page_fallback() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let pdf = PdfFixture::new(&["first", "second", "third"]).write(temp.path());
        let config = PipelineConfig::new(&pdf, temp.path().join("out"));

        let report = run_pipeline(&config).expect("pipeline should succeed");

        assert_eq!(report.toc_count, 1);
        assert_eq!(report.parsed_count, 3);
        assert_eq!(report.missing_in_parsed, 0);
        assert_eq!(report.missing_in_toc, 2);
        assert_eq!(report.coverage, 100.0);
    }

    #[test]
    fn forced_page_strategy_ignores_outline() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let pdf = PdfFixture::new(&["first", "second"])
            .outline(vec![OutlineSpec::page("Overview", 1)])
            .write(temp.path());
        let config = PipelineConfig::new(&pdf, temp.path().join("out"))
            .with_strategy(SectionStrategy::Pages);

        let report = run_pipeline(&config).expect("pipeline should succeed");
        assert_eq!(report.parsed_count, 2);
        assert_eq!(report.missing_in_toc, 1);
    }

    #[test]
    fn missing_document_aborts_with_document_open_code() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = PipelineConfig::new(temp.path().join("nope.pdf"), temp.path().join("out"));

        let err = run_pipeline(&config).expect_err("missing document should fail");
        assert_eq!(exit_code_for(&err), EXIT_DOCUMENT_OPEN);
    }
}
