use anyhow::Result;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::config::ValidateConfig;
use crate::reconcile::validate_outputs;

pub fn run(args: ValidateArgs) -> Result<()> {
    let config = ValidateConfig::from(args);
    info!(output_dir = %config.output_dir().display(), "validating outputs");

    let report = validate_outputs(&config)?;
    let coverage = format!("{:.2}%", report.coverage);
    info!(coverage = %coverage, "validation completed");
    Ok(())
}
