//! Cross-sprint aggregates computed from already-analyzed [`SprintReport`]s.

use crate::sprint::SprintReport;
use crate::types::{DocumentKind, SprintState};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Metric groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintCounts {
    pub total: usize,
    pub uninitialized: usize,
    pub proposed: usize,
    pub active: usize,
    pub completed: usize,
    pub stale: usize,
    /// Sprints with at least one blocker line in their log.
    pub blocked: usize,
    pub completion_rate: f64,
    pub active_ratio: f64,
}

impl SprintCounts {
    pub fn by_state(&self, state: SprintState) -> usize {
        match state {
            SprintState::Uninitialized => self.uninitialized,
            SprintState::Proposed => self.proposed,
            SprintState::Active => self.active,
            SprintState::Completed => self.completed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub task_completion_rate: f64,
    pub total_strides: usize,
    pub completed_strides: usize,
    /// Mean stride-task count over completed sprints.
    pub average_tasks_per_sprint: f64,
    /// Mean checked-task count over completed sprints.
    pub sprint_velocity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentCoverage {
    pub proposal: usize,
    pub plan: usize,
    pub design: usize,
    pub implementation: usize,
    pub retrospective: usize,
    pub planning_coverage: f64,
    pub implementation_coverage: f64,
    pub retrospective_coverage: f64,
    /// Share of plan, implementation and retrospective slots filled.
    pub process_adoption_rate: f64,
}

impl DocumentCoverage {
    pub fn count(&self, kind: DocumentKind) -> usize {
        match kind {
            DocumentKind::Proposal => self.proposal,
            DocumentKind::Plan => self.plan,
            DocumentKind::Design => self.design,
            DocumentKind::Implementation => self.implementation,
            DocumentKind::Retrospective => self.retrospective,
        }
    }
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductivityLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl ProductivityLevel {
    fn from_velocity(velocity: f64) -> Self {
        if velocity >= 10.0 {
            ProductivityLevel::High
        } else if velocity >= 5.0 {
            ProductivityLevel::Medium
        } else if velocity > 0.0 {
            ProductivityLevel::Low
        } else {
            ProductivityLevel::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProductivityLevel::None => "none",
            ProductivityLevel::Low => "low",
            ProductivityLevel::Medium => "medium",
            ProductivityLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessMaturity {
    #[default]
    None,
    Early,
    Developing,
    Mature,
}

impl ProcessMaturity {
    fn from_adoption(rate: f64) -> Self {
        if rate >= 80.0 {
            ProcessMaturity::Mature
        } else if rate >= 50.0 {
            ProcessMaturity::Developing
        } else if rate > 0.0 {
            ProcessMaturity::Early
        } else {
            ProcessMaturity::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessMaturity::None => "none",
            ProcessMaturity::Early => "early",
            ProcessMaturity::Developing => "developing",
            ProcessMaturity::Mature => "mature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    #[default]
    NeedsImprovement,
    Fair,
    Good,
    Excellent,
}

impl OverallStatus {
    fn from_health(score: u32) -> Self {
        match score {
            80.. => OverallStatus::Excellent,
            60..=79 => OverallStatus::Good,
            40..=59 => OverallStatus::Fair,
            _ => OverallStatus::NeedsImprovement,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::NeedsImprovement => "needs_improvement",
            OverallStatus::Fair => "fair",
            OverallStatus::Good => "good",
            OverallStatus::Excellent => "excellent",
        }
    }
}

impl fmt::Display for ProductivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ProcessMaturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// 0..=100
    pub health_score: u32,
    pub productivity: ProductivityLevel,
    pub process_maturity: ProcessMaturity,
    pub overall_status: OverallStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintMetrics {
    pub counts: SprintCounts,
    pub tasks: TaskMetrics,
    pub coverage: DocumentCoverage,
    pub summary: MetricsSummary,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(values: impl Iterator<Item = usize>) -> f64 {
    let (sum, n) = values.fold((0usize, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

pub fn calculate(reports: &[SprintReport]) -> SprintMetrics {
    if reports.is_empty() {
        return SprintMetrics::default();
    }
    let total = reports.len();
    let in_state = |state: SprintState| reports.iter().filter(|r| r.state == state).count();

    let completed = in_state(SprintState::Completed);
    let active = in_state(SprintState::Active);
    let blocked = reports.iter().filter(|r| !r.blockers.is_empty()).count();
    let counts = SprintCounts {
        total,
        uninitialized: in_state(SprintState::Uninitialized),
        proposed: in_state(SprintState::Proposed),
        active,
        completed,
        stale: reports.iter().filter(|r| r.stale).count(),
        blocked,
        completion_rate: rate(completed, total),
        active_ratio: rate(active, total),
    };

    let total_tasks: usize = reports.iter().map(|r| r.tasks.total).sum();
    let completed_tasks: usize = reports.iter().map(|r| r.tasks.completed).sum();
    let finished = || reports.iter().filter(|r| r.state == SprintState::Completed);
    let tasks = TaskMetrics {
        total_tasks,
        completed_tasks,
        pending_tasks: total_tasks - completed_tasks,
        task_completion_rate: rate(completed_tasks, total_tasks),
        total_strides: reports.iter().map(|r| r.progress.total_strides).sum(),
        completed_strides: reports.iter().map(|r| r.progress.completed_strides).sum(),
        average_tasks_per_sprint: mean(finished().map(|r| r.tasks.total)),
        sprint_velocity: mean(finished().map(|r| r.tasks.completed)),
    };

    let with = |kind: DocumentKind| reports.iter().filter(|r| r.documents.contains(kind)).count();
    let plan = with(DocumentKind::Plan);
    let implementation = with(DocumentKind::Implementation);
    let retrospective = with(DocumentKind::Retrospective);
    let coverage = DocumentCoverage {
        proposal: with(DocumentKind::Proposal),
        plan,
        design: with(DocumentKind::Design),
        implementation,
        retrospective,
        planning_coverage: rate(plan, total),
        implementation_coverage: rate(implementation, total),
        retrospective_coverage: rate(retrospective, total),
        process_adoption_rate: rate(plan + implementation + retrospective, total * 3),
    };

    // Weights: sprint completion 40, task completion 30, adoption 20, unblocked 10.
    let health = counts.completion_rate * 0.4
        + tasks.task_completion_rate * 0.3
        + coverage.process_adoption_rate * 0.2
        + rate(total - blocked, total) * 0.1;
    let health_score = (health as u32).min(100);

    let summary = MetricsSummary {
        health_score,
        productivity: ProductivityLevel::from_velocity(tasks.sprint_velocity),
        process_maturity: ProcessMaturity::from_adoption(coverage.process_adoption_rate),
        overall_status: OverallStatus::from_health(health_score),
    };

    tracing::debug!(sprints = total, health = health_score, "metrics calculated");

    SprintMetrics {
        counts,
        tasks,
        coverage,
        summary,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrideConfig;
    use crate::sprint::{analyze, SprintDocuments};
    use chrono::Utc;

    const PLAN: &str = "# Plan: A\n\n## Strides\n\n### Stride 1: One\n\n**Tasks:**\n- [x] a\n- [x] b\n\n### Stride 2: Two\n\n**Tasks:**\n- [ ] c\n- [x] d\n";

    fn report(docs: SprintDocuments) -> SprintReport {
        analyze(&docs, &StrideConfig::default(), None, Utc::now())
    }

    fn sample() -> Vec<SprintReport> {
        let completed = SprintDocuments::default()
            .with(DocumentKind::Proposal, "# Proposal: A\n")
            .with(DocumentKind::Plan, PLAN)
            .with(DocumentKind::Implementation, "## [Timestamp: t] Stride: One\n- stuck on CI\n")
            .with(DocumentKind::Retrospective, "# Retrospective\n");
        let active = SprintDocuments::default()
            .with(DocumentKind::Plan, PLAN)
            .with(DocumentKind::Implementation, "");
        let proposed = SprintDocuments::default().with(DocumentKind::Proposal, "# Proposal: C\n");
        let empty = SprintDocuments::default().with(DocumentKind::Design, "# Design\n");
        vec![report(completed), report(active), report(proposed), report(empty)]
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let m = calculate(&[]);
        assert_eq!(m, SprintMetrics::default());
        assert_eq!(m.summary.overall_status, OverallStatus::NeedsImprovement);
    }

    #[test]
    fn counts_by_state() {
        let m = calculate(&sample());
        assert_eq!(m.counts.total, 4);
        for state in SprintState::all() {
            assert_eq!(m.counts.by_state(*state), 1, "{state}");
        }
        assert_eq!(m.counts.blocked, 1);
        assert!((m.counts.completion_rate - 25.0).abs() < 1e-9);
        assert!((m.counts.active_ratio - 25.0).abs() < 1e-9);
    }

    #[test]
    fn task_totals_and_velocity() {
        let m = calculate(&sample());
        assert_eq!(m.tasks.total_tasks, 8);
        assert_eq!(m.tasks.completed_tasks, 6);
        assert_eq!(m.tasks.pending_tasks, 2);
        assert!((m.tasks.task_completion_rate - 75.0).abs() < 1e-9);
        assert_eq!(m.tasks.total_strides, 4);
        assert_eq!(m.tasks.completed_strides, 1);
        // Only the completed sprint counts toward velocity.
        assert!((m.tasks.sprint_velocity - 3.0).abs() < 1e-9);
        assert!((m.tasks.average_tasks_per_sprint - 4.0).abs() < 1e-9);
        assert_eq!(m.summary.productivity, ProductivityLevel::Low);
    }

    #[test]
    fn document_coverage() {
        let m = calculate(&sample());
        assert_eq!(m.coverage.count(DocumentKind::Proposal), 2);
        assert_eq!(m.coverage.count(DocumentKind::Plan), 2);
        assert_eq!(m.coverage.count(DocumentKind::Design), 1);
        assert_eq!(m.coverage.count(DocumentKind::Implementation), 2);
        assert_eq!(m.coverage.count(DocumentKind::Retrospective), 1);
        assert!((m.coverage.planning_coverage - 50.0).abs() < 1e-9);
        // (2 + 2 + 1) of 12 slots
        assert!((m.coverage.process_adoption_rate - 500.0 / 12.0).abs() < 1e-9);
        assert_eq!(m.summary.process_maturity, ProcessMaturity::Early);
    }

    #[test]
    fn health_score_weights() {
        let m = calculate(&sample());
        // 25*0.4 + 75*0.3 + 41.67*0.2 + 75*0.1 = 48.33
        assert_eq!(m.summary.health_score, 48);
        assert_eq!(m.summary.overall_status, OverallStatus::Fair);
    }

    #[test]
    fn assessment_thresholds() {
        assert_eq!(ProductivityLevel::from_velocity(10.0), ProductivityLevel::High);
        assert_eq!(ProductivityLevel::from_velocity(5.0), ProductivityLevel::Medium);
        assert_eq!(ProductivityLevel::from_velocity(0.0), ProductivityLevel::None);
        assert_eq!(ProcessMaturity::from_adoption(80.0), ProcessMaturity::Mature);
        assert_eq!(ProcessMaturity::from_adoption(50.0), ProcessMaturity::Developing);
        assert_eq!(OverallStatus::from_health(100), OverallStatus::Excellent);
        assert_eq!(OverallStatus::from_health(60), OverallStatus::Good);
        assert_eq!(OverallStatus::from_health(39), OverallStatus::NeedsImprovement);
        assert_eq!(OverallStatus::NeedsImprovement.to_string(), "needs_improvement");
    }
}
