//! Code analyzer report parsing.
//!
//! `sf code-analyzer run --output-format json` prints a JSON array of per-file
//! results, sometimes surrounded by progress noise. Only the outermost array
//! is parsed; anything unparseable yields an empty report with a warning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub description: String,
    /// Normalized severity, 1 (high) to 3 (low). `None` when the analyzer
    /// did not report one.
    pub severity: Option<u8>,
    pub file: String,
    pub line: u64,
}

impl Violation {
    /// Map one analyzer violation entry; `None` when it is not an object.
    fn from_entry(entry: &Value, file: &str) -> Option<Self> {
        let entry = entry.as_object()?;
        let text = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            rule: text("ruleName"),
            description: text("message"),
            severity: entry
                .get("severity")
                .and_then(Value::as_u64)
                .and_then(|s| u8::try_from(s).ok()),
            file: file.to_string(),
            line: entry.get("line").and_then(Value::as_u64).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyzerReport {
    pub violations: Vec<Violation>,
    pub exit_code: i32,
}

impl AnalyzerReport {
    pub fn parse(stdout: &str, exit_code: i32) -> Self {
        let mut report = Self {
            violations: Vec::new(),
            exit_code,
        };
        let (Some(start), Some(end)) = (stdout.find('['), stdout.rfind(']')) else {
            return report;
        };
        if end < start {
            return report;
        }

        let results = match serde_json::from_str::<Vec<Value>>(&stdout[start..=end]) {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "failed to parse analyzer output");
                return report;
            }
        };

        for result in &results {
            let file = result
                .get("fileName")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(entries) = result.get("violations").and_then(Value::as_array) else {
                continue;
            };
            for entry in entries {
                match Violation::from_entry(entry, file) {
                    Some(violation) => {
                        if violation.severity.is_none() {
                            warn!(
                                rule = %violation.rule,
                                file,
                                "analyzer violation has no severity"
                            );
                        }
                        report.violations.push(violation);
                    }
                    None => warn!(file, entry = %entry, "skipping unusable analyzer violation"),
                }
            }
        }
        report
    }

    /// Violations at or above the given severity (lower is more severe).
    ///
    /// A violation without a severity always counts.
    pub fn at_least(&self, severity: u8) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.severity.map_or(true, |s| s <= severity))
    }
}
