//! Validation verdicts produced by the rule engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single rule hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

/// Merged outcome of every applicable rule. Computed fresh, never persisted
/// except inside audit artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl ValidationResult {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for f in &findings {
            let line = format!("[{}] {}", f.rule, f.message);
            match f.severity {
                Severity::Error => errors.push(line),
                Severity::Warning => warnings.push(line),
            }
        }
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            findings,
        }
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.findings.iter().any(|f| f.rule == rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_invalidate() {
        let result = ValidationResult::from_findings(vec![Finding {
            rule: "hashtags".into(),
            severity: Severity::Warning,
            message: "no hashtags".into(),
        }]);
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["[hashtags] no hashtags"]);
        assert!(result.errors.is_empty());
    }
}
