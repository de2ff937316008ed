use std::path::PathBuf;

/// Failures the pipeline needs to tell apart, either to absorb them locally
/// or to choose the process exit code.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to open document {}", path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("failed to extract text from page {page}: {reason}")]
    PageExtraction { page: u32, reason: String },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record {section_id} violates the output schema: {reason}")]
    Schema { section_id: String, reason: String },
}

impl ExtractError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DocumentOpen { .. } => EXIT_DOCUMENT_OPEN,
            Self::Write { .. } => EXIT_WRITE,
            Self::Schema { .. } => EXIT_SCHEMA,
            Self::PageExtraction { .. } => EXIT_OTHER,
        }
    }
}

/// clap exits with 2 on usage errors, so no classified failure uses it.
pub const EXIT_DOCUMENT_OPEN: i32 = 1;
pub const EXIT_SCHEMA: i32 = 3;
pub const EXIT_OTHER: i32 = 4;
pub const EXIT_WRITE: i32 = 5;

/// Picks the exit code from the first classified error in the chain.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExtractError>())
        .map(ExtractError::exit_code)
        .unwrap_or(EXIT_OTHER)
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn exit_code_follows_wrapped_extract_error() {
        let err = Err::<(), _>(ExtractError::write(
            "out/toc.jsonl",
            std::io::Error::other("disk full"),
        ))
        .context("failed to persist TOC outputs")
        .expect_err("write error should propagate");

        assert_eq!(exit_code_for(&err), EXIT_WRITE);
    }

    #[test]
    fn classified_exit_codes_differ_from_usage_errors() {
        use clap::Parser;

        let usage = crate::cli::Cli::try_parse_from(["specparse", "frobnicate"])
            .expect_err("unknown subcommand should be rejected");
        for code in [EXIT_DOCUMENT_OPEN, EXIT_WRITE, EXIT_SCHEMA, EXIT_OTHER] {
            assert_ne!(code, usage.exit_code());
        }
    }

    #[test]
    fn unclassified_errors_map_to_generic_exit_code() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), EXIT_OTHER);
    }
}
