use futures::future::join_all;
use ulid::Ulid;

use crate::model::*;

use super::matcher::{is_eligible, rank, Candidates};
use super::validator::validate_window;
use super::{Engine, EngineError, Peak};

impl Engine {
    /// Peak concurrent allocation for an engineer inside `span`.
    /// Zero for an engineer without a partition.
    pub async fn peak_in_window(&self, engineer_id: Ulid, span: &Span) -> Peak {
        match self.get_ledger(&engineer_id) {
            Some(ledger) => ledger.read().await.peak(span, None),
            None => Peak::ZERO,
        }
    }

    /// Sum of every allocation overlapping `window`, concurrent or not.
    pub async fn allocated(&self, engineer_id: Ulid, window: &Window) -> Result<Percent, EngineError> {
        validate_window(window)?;
        Ok(match self.get_ledger(&engineer_id) {
            Some(ledger) => ledger.read().await.allocated(&window.span()),
            None => 0,
        })
    }

    /// Capacity of an engineer inside `window`, or across all time without one.
    pub async fn engineer_capacity(
        &self,
        engineer_id: Ulid,
        window: Option<Window>,
    ) -> Result<Capacity, EngineError> {
        let engineer = self.engineer(engineer_id).await?;
        self.capacity_of(&engineer, window).await
    }

    async fn capacity_of(&self, engineer: &Engineer, window: Option<Window>) -> Result<Capacity, EngineError> {
        let span = match window {
            Some(w) => {
                validate_window(&w)?;
                w.span()
            }
            None => Span::ALL,
        };
        let peak = self.peak_in_window(engineer.id, &span).await;
        Ok(Capacity::new(engineer.max_capacity, peak.value))
    }

    /// Every engineer-role user with their capacity.
    pub async fn engineers_with_capacity(
        &self,
        window: Option<Window>,
    ) -> Result<Vec<EngineerCapacity>, EngineError> {
        let mut engineers = self.directory.engineers().await;
        engineers.retain(|e| e.role == Role::Engineer);
        engineers.sort_by_key(|e| e.id);

        let capacities = join_all(engineers.iter().map(|e| self.capacity_of(e, window))).await;
        engineers
            .into_iter()
            .zip(capacities)
            .map(|(engineer, capacity)| capacity.map(|capacity| EngineerCapacity { engineer, capacity }))
            .collect()
    }

    /// Rank skill-eligible engineers by capacity left in the project's window.
    /// Reads only; every call ranks against the ledger as it is now.
    pub async fn match_candidates(&self, project: &Project) -> Result<Candidates, EngineError> {
        let window = project.window();
        validate_window(&window)?;
        let span = window.span();

        let eligible: Vec<Engineer> = self
            .directory
            .engineers()
            .await
            .into_iter()
            .filter(|e| is_eligible(e, project))
            .collect();

        let peaks = join_all(eligible.iter().map(|e| self.peak_in_window(e.id, &span))).await;
        let candidates = eligible
            .iter()
            .zip(peaks)
            .map(|(e, peak)| Candidate {
                engineer_id: e.id,
                available_capacity: i64::from(e.max_capacity) - i64::from(peak.value),
                seniority: e.seniority,
            })
            .collect();

        let ranked = rank(candidates);
        metrics::histogram!(crate::observability::CANDIDATES_RETURNED).record(ranked.len() as f64);
        Ok(ranked)
    }

    /// Team-sized shortlist per project, in input order. A project that
    /// cannot be matched gets its own error and does not affect the rest.
    pub async fn shortlists(&self, projects: &[Project]) -> Vec<Result<Vec<Candidate>, EngineError>> {
        let mut out = Vec::with_capacity(projects.len());
        for project in projects {
            out.push(
                self.match_candidates(project)
                    .await
                    .map(|c| c.shortlist(project.team_size as usize)),
            );
        }
        out
    }

    pub async fn match_candidates_for(&self, project_id: Ulid) -> Result<Candidates, EngineError> {
        let project = self.project(project_id).await?;
        self.match_candidates(&project).await
    }

    pub async fn get_assignment(&self, id: Ulid) -> Option<Assignment> {
        let engineer_id = self.get_engineer_for_assignment(&id)?;
        let ledger = self.get_ledger(&engineer_id)?;
        let guard = ledger.read().await;
        guard.get(id).cloned()
    }

    pub async fn assignments_for_engineer(&self, engineer_id: Ulid) -> Vec<Assignment> {
        match self.get_ledger(&engineer_id) {
            Some(ledger) => ledger.read().await.assignments().to_vec(),
            None => Vec::new(),
        }
    }

    /// All committed assignments, grouped by engineer, each group in start order.
    pub async fn list_assignments(&self) -> Vec<Assignment> {
        let mut ledgers: Vec<_> = self
            .ledgers
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        ledgers.sort_by_key(|(id, _)| *id);

        let mut out = Vec::new();
        for (_, ledger) in ledgers {
            out.extend_from_slice(ledger.read().await.assignments());
        }
        out
    }
}
