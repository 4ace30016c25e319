//! Publishing run outputs the way GitHub Actions expects them.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use glassops_core::RunOutputs;

/// Append `key=value` lines to `path`, or print them when no file is given.
pub fn publish(outputs: &RunOutputs, path: Option<&Path>) -> Result<()> {
    let mut lines = String::new();
    for (key, value) in outputs.to_pairs() {
        lines.push_str(&format!("{}={}\n", key, value));
    }

    match path {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open output file {}", path.display()))?;
            file.write_all(lines.as_bytes())
                .with_context(|| format!("failed to write output file {}", path.display()))?;
        }
        None => print!("{}", lines),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "previous=1\n").unwrap();

        let outputs = RunOutputs {
            runtime_id: "abc".into(),
            is_locked: true,
            ..RunOutputs::default()
        };
        publish(&outputs, Some(&path)).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "previous=1\nruntime_id=abc\nis_locked=true\nglassops_ready=false\n"
        );
    }
}
