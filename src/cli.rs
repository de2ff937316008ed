use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_OUTPUT_DIR;

#[derive(Parser, Debug)]
#[command(
    name = "specparse",
    version,
    about = "Specification PDF table-of-contents and section extraction with coverage checks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract TOC and sections, write outputs, then reconcile them.
    Run(ExtractArgs),
    /// Extract only the table of contents.
    Toc(TocArgs),
    /// Extract only the per-section content.
    Sections(ExtractArgs),
    /// Reconcile previously written TOC and section outputs.
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    pub pdf: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = SectionStrategy::Auto)]
    pub strategy: SectionStrategy,
}

#[derive(Args, Debug, Clone)]
pub struct TocArgs {
    pub pdf: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SectionStrategy {
    Auto,
    Toc,
    Pages,
}

impl SectionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Toc => "toc",
            Self::Pages => "pages",
        }
    }
}
