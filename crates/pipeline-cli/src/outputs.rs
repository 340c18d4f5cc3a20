use std::io::Write;
use std::path::Path;

use anyhow::Context;
use pipeline_core::ExecutionOutcome;

fn pairs(outcome: &ExecutionOutcome) -> [(&'static str, &str); 3] {
    [
        ("pipeline-execution-id", outcome.execution_id.as_str()),
        ("pipeline-execution-status", outcome.status.as_str()),
        ("pipeline-execution-url", outcome.url.as_str()),
    ]
}

/// Append the step outputs to `path` as `name=value` lines, or print them
/// when no output file is configured.
pub fn write_outputs(path: Option<&Path>, outcome: &ExecutionOutcome) -> anyhow::Result<()> {
    let Some(path) = path else {
        for (name, value) in pairs(outcome) {
            println!("{name}={value}");
        }
        return Ok(());
    };

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file {}", path.display()))?;
    for (name, value) in pairs(outcome) {
        writeln!(file, "{name}={value}")
            .with_context(|| format!("failed to write output {name}"))?;
    }
    tracing::debug!(path = %path.display(), "wrote step outputs");
    Ok(())
}
