use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Integer percentage of an engineer's full-time capacity.
pub type Percent = u32;

pub const DEFAULT_MAX_CAPACITY: Percent = 100;

/// Half-open interval `[start, end)`. Internal representation of a [`Window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    /// Everything, for capacity questions asked without a window.
    pub const ALL: Span = Span {
        start: Ms::MIN,
        end: Ms::MAX,
    };

    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Intersection of two spans, if they overlap.
    pub fn clamp_to(&self, other: &Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Span { start, end })
    }
}

/// Closed interval `[start, end]`. `start == end` is a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Ms,
    pub end: Ms,
}

impl Window {
    pub fn new(start: Ms, end: Ms) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Half-open equivalent: `[start, end + 1)`.
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end.saturating_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Engineer,
}

/// Declaration order is rank order: `Senior` compares greatest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    #[default]
    Junior,
    Mid,
    Senior,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Completed,
}

/// Set of skill tags. Tags compare exactly; no normalisation is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Superset test: every tag in `required` is present here.
    /// An empty requirement is covered by any set.
    pub fn covers(&self, required: &SkillSet) -> bool {
        self.0.is_superset(&required.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

fn default_max_capacity() -> Percent {
    DEFAULT_MAX_CAPACITY
}

/// A user from the external directory. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engineer {
    pub id: Ulid,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub skills: SkillSet,
    #[serde(default)]
    pub seniority: Seniority,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: Percent,
}

impl Engineer {
    pub fn new(id: Ulid, role: Role) -> Self {
        Self {
            id,
            name: String::new(),
            role,
            skills: SkillSet::new(),
            seniority: Seniority::default(),
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

/// A project from the external directory. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Ulid,
    #[serde(default)]
    pub name: String,
    pub manager_id: Ulid,
    #[serde(default)]
    pub required_skills: SkillSet,
    #[serde(default)]
    pub team_size: u32,
    pub start: Ms,
    pub end: Ms,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl Project {
    pub fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }
}

/// A committed allocation of an engineer to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Ulid,
    pub engineer_id: Ulid,
    pub project_id: Ulid,
    pub allocation: Percent,
    pub start: Ms,
    pub end: Ms,
    pub role: String,
}

impl Assignment {
    pub fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }

    pub fn span(&self) -> Span {
        self.window().span()
    }

    /// Apply a partial update. Absent fields keep their current value.
    pub fn patched(&self, patch: &AssignmentPatch) -> Assignment {
        Assignment {
            id: self.id,
            engineer_id: patch.engineer_id.unwrap_or(self.engineer_id),
            project_id: patch.project_id.unwrap_or(self.project_id),
            allocation: patch.allocation.unwrap_or(self.allocation),
            start: patch.start.unwrap_or(self.start),
            end: patch.end.unwrap_or(self.end),
            role: patch.role.clone().unwrap_or_else(|| self.role.clone()),
        }
    }

    /// True when `other` differs in a field that affects capacity.
    pub fn capacity_differs(&self, other: &Assignment) -> bool {
        self.engineer_id != other.engineer_id
            || self.allocation != other.allocation
            || self.start != other.start
            || self.end != other.end
    }
}

/// Creation input for an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub engineer_id: Ulid,
    pub project_id: Ulid,
    pub allocation: Percent,
    pub start: Ms,
    pub end: Ms,
    #[serde(default)]
    pub role: String,
}

/// Partial update. `None` means "keep the current value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    pub engineer_id: Option<Ulid>,
    pub project_id: Option<Ulid>,
    pub allocation: Option<Percent>,
    pub start: Option<Ms>,
    pub end: Option<Ms>,
    pub role: Option<String>,
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub max_capacity: Percent,
    /// Peak concurrent allocation inside the queried window.
    pub allocated: Percent,
    /// Negative only if `max_capacity` was lowered below existing commitments.
    pub available_capacity: i64,
}

impl Capacity {
    pub fn new(max_capacity: Percent, allocated: Percent) -> Self {
        Self {
            max_capacity,
            allocated,
            available_capacity: i64::from(max_capacity) - i64::from(allocated),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerCapacity {
    pub engineer: Engineer,
    pub capacity: Capacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub engineer_id: Ulid,
    pub available_capacity: i64,
    pub seniority: Seniority,
}

/// Change feed record, emitted after every ledger commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    AssignmentAdded(Assignment),
    AssignmentReplaced {
        previous: Assignment,
        current: Assignment,
    },
    AssignmentRemoved(Assignment),
}

impl LedgerEvent {
    /// Engineers whose ledger partition this event touched.
    pub fn engineer_ids(&self) -> Vec<Ulid> {
        match self {
            LedgerEvent::AssignmentAdded(a) | LedgerEvent::AssignmentRemoved(a) => {
                vec![a.engineer_id]
            }
            LedgerEvent::AssignmentReplaced { previous, current } => {
                if previous.engineer_id == current.engineer_id {
                    vec![current.engineer_id]
                } else {
                    vec![previous.engineer_id, current.engineer_id]
                }
            }
        }
    }
}
