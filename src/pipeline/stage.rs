use std::fmt;

/// Pipeline states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    OrthoPan,
    PromotePan,
    OrthoMul,
    PromoteMul,
    Pansharpen,
    BuildOverviews,
    PublishMetadata,
    PublishOutputs,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::OrthoPan => "ortho-pan",
            Stage::PromotePan => "promote-pan",
            Stage::OrthoMul => "ortho-mul",
            Stage::PromoteMul => "promote-mul",
            Stage::Pansharpen => "pansharpen",
            Stage::BuildOverviews => "build-overviews",
            Stage::PublishMetadata => "publish-metadata",
            Stage::PublishOutputs => "publish-outputs",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    Completed,
    /// Outputs already present, or inputs absent
    Skipped,
    /// Non-fatal problem; the product may still be complete
    Warning(String),
    Failed(String),
}

impl StageResult {
    pub fn from_warnings(warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            StageResult::Completed
        } else {
            StageResult::Warning(warnings.join("; "))
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageResult::Failed(_))
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    stages: Vec<(Stage, StageResult)>,
    product_exists: bool,
}

impl PipelineReport {
    pub fn record(&mut self, stage: Stage, result: StageResult) {
        self.stages.push((stage, result));
    }

    pub fn finish(&mut self, product_exists: bool) {
        self.product_exists = product_exists;
    }

    pub fn stages(&self) -> &[(Stage, StageResult)] {
        &self.stages
    }

    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, result)| result)
    }

    pub fn product_exists(&self) -> bool {
        self.product_exists
    }

    /// 0 when no stage failed and the final product exists, 1 otherwise
    pub fn status(&self) -> i32 {
        if self.product_exists && !self.stages.iter().any(|(_, r)| r.is_failure()) {
            0
        } else {
            1
        }
    }

    pub fn failure_summary(&self) -> String {
        let failed: Vec<String> = self
            .stages
            .iter()
            .filter_map(|(stage, result)| match result {
                StageResult::Failed(message) => Some(format!("{stage}: {message}")),
                _ => None,
            })
            .collect();
        if failed.is_empty() && !self.product_exists {
            "pansharpened product was not produced".to_string()
        } else {
            failed.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_requires_product_and_no_failures() {
        let mut report = PipelineReport::default();
        report.record(Stage::OrthoPan, StageResult::Completed);
        report.record(Stage::BuildOverviews, StageResult::Warning("gdaladdo".into()));
        report.finish(true);
        assert_eq!(report.status(), 0);

        report.record(Stage::Pansharpen, StageResult::Failed("exit 1".into()));
        assert_eq!(report.status(), 1);
        assert_eq!(report.failure_summary(), "pansharpen: exit 1");
    }

    #[test]
    fn test_missing_product_fails() {
        let mut report = PipelineReport::default();
        report.record(Stage::Pansharpen, StageResult::Skipped);
        report.finish(false);
        assert_eq!(report.status(), 1);
        assert_eq!(report.failure_summary(), "pansharpened product was not produced");
    }

    #[test]
    fn test_from_warnings() {
        assert_eq!(StageResult::from_warnings(vec![]), StageResult::Completed);
        assert_eq!(
            StageResult::from_warnings(vec!["a".into(), "b".into()]),
            StageResult::Warning("a; b".into())
        );
    }
}
