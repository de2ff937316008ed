use std::collections::BTreeSet;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ValidateConfig;
use crate::model::ValidationReport;
use crate::output::{load_jsonl, write_key_value_xlsx};
use crate::util::write_json_pretty;

/// Compares the `section_id` sets of the TOC and parsed-section records.
///
/// Counts cover every record; records without an id only affect the counts.
pub fn build_report(toc: &[Value], parsed: &[Value]) -> ValidationReport {
    let toc_ids = collect_section_ids(toc);
    let parsed_ids = collect_section_ids(parsed);

    let missing_in_parsed_ids = toc_ids
        .difference(&parsed_ids)
        .cloned()
        .collect::<Vec<String>>();
    let missing_in_toc_ids = parsed_ids
        .difference(&toc_ids)
        .cloned()
        .collect::<Vec<String>>();

    ValidationReport {
        toc_count: toc.len(),
        parsed_count: parsed.len(),
        missing_in_parsed: missing_in_parsed_ids.len(),
        missing_in_toc: missing_in_toc_ids.len(),
        coverage: coverage_percent(toc.len(), missing_in_parsed_ids.len()),
        missing_in_parsed_ids,
        missing_in_toc_ids,
    }
}

/// `100.0` for an empty TOC.
pub fn coverage_percent(toc_count: usize, missing_in_parsed: usize) -> f64 {
    if toc_count == 0 {
        return 100.0;
    }
    let covered = toc_count.saturating_sub(missing_in_parsed);
    covered as f64 / toc_count as f64 * 100.0
}

fn collect_section_ids(records: &[Value]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| match record.get("section_id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

/// Loads both JSON-lines outputs, writes the report spreadsheet and JSON, and
/// returns the report.
pub fn validate_outputs(config: &ValidateConfig) -> Result<ValidationReport> {
    let toc_path = config.artifact_path(&config.artifacts.toc_jsonl);
    let sections_path = config.artifact_path(&config.artifacts.sections_jsonl);

    let toc = load_jsonl::<Value>(&toc_path)?;
    let sections = load_jsonl::<Value>(&sections_path)?;
    for (path, skipped) in [
        (&toc_path, toc.skipped_lines),
        (&sections_path, sections.skipped_lines),
    ] {
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "dropped unparseable jsonl lines");
        }
    }

    let report = build_report(&toc.records, &sections.records);

    info!(
        toc_count = report.toc_count,
        parsed_count = report.parsed_count,
        missing_in_parsed = report.missing_in_parsed,
        missing_in_toc = report.missing_in_toc,
        coverage = report.coverage,
        "validation report"
    );

    let report_xlsx = config.artifact_path(&config.artifacts.report_xlsx);
    write_key_value_xlsx(&report_xlsx, &report.metric_rows())?;
    let report_json = config.artifact_path(&config.artifacts.report_json);
    write_json_pretty(&report_json, &report)?;

    info!(path = %report_xlsx.display(), "wrote validation report");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::TocEntry;
    use crate::output::write_jsonl;

    fn ids(values: &[&str]) -> Vec<Value> {
        values.iter().map(|id| json!({ "section_id": id })).collect()
    }

    #[test]
    fn equal_id_sets_give_full_coverage() {
        let report = build_report(&ids(&["1", "2", "3"]), &ids(&["3", "2", "1"]));

        assert_eq!(report.coverage, 100.0);
        assert_eq!(report.missing_in_parsed, 0);
        assert_eq!(report.missing_in_toc, 0);
    }

    #[test]
    fn empty_inputs_give_full_coverage() {
        let report = build_report(&[], &[]);
        assert_eq!(report.toc_count, 0);
        assert_eq!(report.coverage, 100.0);
    }

    #[test]
    fn removing_a_parsed_id_strictly_lowers_coverage() {
        let toc = ids(&["1", "2", "3", "4"]);
        let mut parsed = ids(&["1", "2", "3", "4"]);
        let mut previous = build_report(&toc, &parsed);

        while !parsed.is_empty() {
            parsed.pop();
            let report = build_report(&toc, &parsed);
            assert!(report.coverage < previous.coverage);
            assert_eq!(report.missing_in_parsed, previous.missing_in_parsed + 1);
            previous = report;
        }
        assert_eq!(previous.coverage, 0.0);
    }

    #[test]
    fn symmetric_difference_is_reported_both_ways() {
        let report = build_report(&ids(&["1", "2", "A"]), &ids(&["1", "2", "3", "4"]));

        assert_eq!(report.toc_count, 3);
        assert_eq!(report.parsed_count, 4);
        assert_eq!(report.missing_in_parsed_ids, vec!["A"]);
        assert_eq!(report.missing_in_toc_ids, vec!["3", "4"]);
        assert!((report.coverage - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn numeric_ids_match_string_ids_and_missing_ids_only_count() {
        let toc = vec![json!({"section_id": "7"}), json!({"title": "no id"})];
        let parsed = vec![json!({"section_id": 7})];

        let report = build_report(&toc, &parsed);
        assert_eq!(report.toc_count, 2);
        assert_eq!(report.missing_in_parsed, 0);
        assert_eq!(report.missing_in_toc, 0);
    }

    #[test]
    fn validate_outputs_reads_files_and_writes_reports() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = ValidateConfig::new(temp.path());

        write_jsonl(
            &config.artifact_path(&config.artifacts.toc_jsonl),
            &[TocEntry::top_level("1", "Introduction", 1)],
        )
        .expect("toc should write");
        std::fs::write(
            config.artifact_path(&config.artifacts.sections_jsonl),
            "{\"section_id\":\"1\",\"title\":\"Test\"}\ngarbage line\n{\"section_id\":\"2\"}\n",
        )
        .expect("sections fixture should be written");

        let report = validate_outputs(&config).expect("validation should run");
        assert_eq!(report.toc_count, 1);
        assert_eq!(report.parsed_count, 2);
        assert_eq!(report.missing_in_toc, 1);
        assert_eq!(report.coverage, 100.0);

        assert!(config.artifact_path(&config.artifacts.report_xlsx).is_file());
        let json: ValidationReport = serde_json::from_slice(
            &std::fs::read(config.artifact_path(&config.artifacts.report_json))
                .expect("report json should exist"),
        )
        .expect("report json should parse");
        assert_eq!(json, report);
    }
}
