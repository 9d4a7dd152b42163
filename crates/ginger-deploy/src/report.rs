//! Per-entity deployment outcomes

use serde::Serialize;
use std::fmt;

/// Deployment phase, in the order `deploy_all` runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Hook,
    Functions,
    Storage,
    Schedulers,
    Resources,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Hook => "hook",
            Phase::Functions => "functions",
            Phase::Storage => "storage",
            Phase::Schedulers => "schedulers",
            Phase::Resources => "resources",
            Phase::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Function,
    Object,
    Bucket,
    Scheduler,
    Target,
    Container,
    Resource,
    Integration,
    Stage,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Function => "function",
            EntityKind::Object => "object",
            EntityKind::Bucket => "bucket",
            EntityKind::Scheduler => "scheduler",
            EntityKind::Target => "target",
            EntityKind::Container => "container",
            EntityKind::Resource => "resource",
            EntityKind::Integration => "integration",
            EntityKind::Stage => "stage",
        };
        f.write_str(name)
    }
}

/// What happened to one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Outcome {
    Created,
    Updated,
    /// Already present remotely; only its id was recorded
    Adopted,
    Unchanged,
    Deleted,
    Skipped(String),
    Failed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Adopted => "adopted",
            Outcome::Unchanged => "unchanged",
            Outcome::Deleted => "deleted",
            Outcome::Skipped(_) => "skipped",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Skipped(reason) | Outcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityOutcome {
    pub kind: EntityKind,
    pub name: String,
    pub outcome: Outcome,
}

/// Outcomes of one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub entities: Vec<EntityOutcome>,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            entities: Vec::new(),
        }
    }

    pub fn record(&mut self, kind: EntityKind, name: impl Into<String>, outcome: Outcome) {
        self.entities.push(EntityOutcome {
            kind,
            name: name.into(),
            outcome,
        });
    }

    pub fn fail(&mut self, kind: EntityKind, name: impl Into<String>, reason: impl ToString) {
        self.record(kind, name, Outcome::Failed(reason.to_string()));
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.entities.iter().filter(|e| e.outcome.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn outcome_of(&self, kind: EntityKind, name: &str) -> Option<&Outcome> {
        self.entities
            .iter()
            .find(|e| e.kind == kind && e.name == name)
            .map(|e| &e.outcome)
    }
}

/// Overall status, mapped onto the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl DeployStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployStatus::Success => 0,
            DeployStatus::Failed => 1,
            DeployStatus::PartialSuccess => 2,
        }
    }
}

/// Result of a multi-phase run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub phases: Vec<PhaseReport>,
    /// Phase that hit a hard error, and the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<(Phase, String)>,
}

impl DeployReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, phase: PhaseReport) {
        self.phases.push(phase);
    }

    pub fn abort(&mut self, phase: Phase, error: impl ToString) {
        self.aborted = Some((phase, error.to_string()));
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.phases.iter().flat_map(|p| p.entities.iter())
    }

    pub fn status(&self) -> DeployStatus {
        if self.aborted.is_some() {
            DeployStatus::Failed
        } else if self.phases.iter().any(PhaseReport::has_failures) {
            DeployStatus::PartialSuccess
        } else {
            DeployStatus::Success
        }
    }
}

impl From<PhaseReport> for DeployReport {
    fn from(phase: PhaseReport) -> Self {
        Self {
            phases: vec![phase],
            aborted: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let mut report = DeployReport::new();
        assert_eq!(report.status(), DeployStatus::Success);
        assert_eq!(report.status().exit_code(), 0);

        let mut functions = PhaseReport::new(Phase::Functions);
        functions.record(EntityKind::Function, "ok", Outcome::Created);
        functions.fail(EntityKind::Function, "broken", "build failed");
        report.push(functions);
        assert_eq!(report.status(), DeployStatus::PartialSuccess);
        assert_eq!(report.status().exit_code(), 2);

        report.abort(Phase::Storage, "bucket creation failed");
        assert_eq!(report.status(), DeployStatus::Failed);
        assert_eq!(report.status().exit_code(), 1);
    }

    #[test]
    fn test_outcome_lookup() {
        let mut phase = PhaseReport::new(Phase::Resources);
        phase.record(EntityKind::Resource, "/a", Outcome::Created);
        assert_eq!(
            phase.outcome_of(EntityKind::Resource, "/a"),
            Some(&Outcome::Created)
        );
        assert!(phase.outcome_of(EntityKind::Integration, "/a").is_none());
        assert!(!phase.has_failures());
    }
}
