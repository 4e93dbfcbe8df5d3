use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SampleStatus {
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReport {
    pub sample: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: SampleStatus,
    /// Result reused from the cache.
    #[serde(default)]
    pub cached: bool,
}

///
/// End-of-run summary. Lists every discovered sample, in discovery order, with
/// its outcome.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub genes: usize,
    pub gene_model_digest: String,
    pub cut_points: Vec<String>,
    pub samples: Vec<SampleReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> Vec<&str> {
        self.samples
            .iter()
            .filter(|s| s.status == SampleStatus::Succeeded)
            .map(|s| s.sample.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.samples
            .iter()
            .filter_map(|s| match &s.status {
                SampleStatus::Failed { reason } => Some((s.sample.as_str(), reason.as_str())),
                SampleStatus::Succeeded => None,
            })
            .collect()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed().is_empty() && !self.succeeded().is_empty()
    }

    /// Log one line per failed sample at warning level, plus a summary line.
    pub fn log_summary(&self) {
        let failed = self.failed();
        for (sample, reason) in &failed {
            log::warn!("Sample {} failed: {}", sample, reason);
        }
        if failed.is_empty() {
            log::info!("All {} samples processed", self.samples.len());
        } else {
            log::warn!(
                "{} of {} samples failed; outputs contain the {} that succeeded",
                failed.len(),
                self.samples.len(),
                self.samples.len() - failed.len()
            );
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn report() -> RunReport {
        RunReport {
            genes: 2,
            gene_model_digest: "abc".to_string(),
            cut_points: vec!["(0,100]".to_string(), "(100,Inf]".to_string()],
            samples: vec![
                SampleReport {
                    sample: "a".to_string(),
                    path: PathBuf::from("a.bam"),
                    status: SampleStatus::Succeeded,
                    cached: false,
                },
                SampleReport {
                    sample: "b".to_string(),
                    path: PathBuf::from("b.bam"),
                    status: SampleStatus::Failed {
                        reason: "truncated".to_string(),
                    },
                    cached: false,
                },
            ],
        }
    }

    #[rstest]
    fn test_partial_success() {
        let report = report();
        assert_eq!(report.succeeded(), vec!["a"]);
        assert_eq!(report.failed(), vec![("b", "truncated")]);
        assert!(report.is_partial());
    }

    #[rstest]
    fn test_json_round_trip() {
        let report = report();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"status\": \"failed\""));
        assert!(json.contains("\"reason\": \"truncated\""));
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
