use std::path::{Path, PathBuf};

use crate::cli::{ExtractArgs, SectionStrategy, TocArgs, ValidateArgs};

pub const DEFAULT_OUTPUT_DIR: &str = "sample_out";

/// File names of every artifact written under the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub toc_jsonl: String,
    pub toc_xlsx: String,
    pub sections_jsonl: String,
    pub sections_xlsx: String,
    pub report_xlsx: String,
    pub report_json: String,
    pub run_manifest: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            toc_jsonl: "usb_pd_toc.jsonl".to_string(),
            toc_xlsx: "usb_pd_toc.xlsx".to_string(),
            sections_jsonl: "usb_pd_spec.jsonl".to_string(),
            sections_xlsx: "usb_pd_sections_with_content.xlsx".to_string(),
            report_xlsx: "validation_report.xlsx".to_string(),
            report_json: "validation_report.json".to_string(),
            run_manifest: "run_manifest.json".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub document_path: PathBuf,
    pub output_dir: PathBuf,
    pub strategy: SectionStrategy,
    pub artifacts: ArtifactNames,
}

impl PipelineConfig {
    pub fn new(document_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            document_path: document_path.into(),
            output_dir: output_dir.into(),
            strategy: SectionStrategy::Auto,
            artifacts: ArtifactNames::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: SectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

impl From<ExtractArgs> for PipelineConfig {
    fn from(args: ExtractArgs) -> Self {
        PipelineConfig::new(args.pdf, args.output_dir).with_strategy(args.strategy)
    }
}

impl From<TocArgs> for PipelineConfig {
    fn from(args: TocArgs) -> Self {
        PipelineConfig::new(args.pdf, args.output_dir)
    }
}

/// Reconciliation only needs the output side of the configuration.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    pub output_dir: PathBuf,
    pub artifacts: ArtifactNames,
}

impl ValidateConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            artifacts: ArtifactNames::default(),
        }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl From<ValidateArgs> for ValidateConfig {
    fn from(args: ValidateArgs) -> Self {
        ValidateConfig::new(args.output_dir)
    }
}

impl From<&PipelineConfig> for ValidateConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            artifacts: config.artifacts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_args_map_onto_pipeline_config() {
        let args = ExtractArgs {
            pdf: PathBuf::from("spec.pdf"),
            output_dir: PathBuf::from("out"),
            strategy: SectionStrategy::Pages,
        };

        let config = PipelineConfig::from(args);
        assert_eq!(config.document_path, PathBuf::from("spec.pdf"));
        assert_eq!(config.strategy, SectionStrategy::Pages);
        assert_eq!(
            config.artifact_path(&config.artifacts.toc_jsonl),
            PathBuf::from("out").join("usb_pd_toc.jsonl")
        );
    }

    #[test]
    fn validate_config_inherits_artifact_names() {
        let mut config = PipelineConfig::new("a.pdf", DEFAULT_OUTPUT_DIR);
        config.artifacts.sections_jsonl = "custom.jsonl".to_string();

        let validate = ValidateConfig::from(&config);
        assert_eq!(validate.output_dir(), Path::new(DEFAULT_OUTPUT_DIR));
        assert_eq!(validate.artifacts.sections_jsonl, "custom.jsonl");
    }
}
