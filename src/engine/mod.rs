mod error;
mod ledger;
mod lifecycle;
mod matcher;
mod queries;
mod sweep;
mod validator;

pub use error::{AuthorizationError, EngineError, NotFoundError, ValidationError};
pub use ledger::EngineerLedger;
pub use matcher::{compare_candidates, is_eligible, rank, Candidates};
pub use sweep::{peak_in_window, Peak};
pub use validator::{validate, Verdict};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tokio::time::Instant;
use ulid::Ulid;

use crate::config::EngineConfig;
use crate::directory::Directory;
use crate::model::*;
use crate::notify::NotifyHub;

pub type SharedLedger = Arc<RwLock<EngineerLedger>>;
pub type LedgerWriteGuard = OwnedRwLockWriteGuard<EngineerLedger>;

/// Capacity & assignment scheduling engine.
///
/// The ledger is partitioned per engineer. Each partition sits behind its own
/// `RwLock`: mutations hold the write half across validate + commit, readers
/// take the read half and see a consistent snapshot. Partitions never lock
/// each other except when an update moves an assignment between engineers,
/// in which case both are locked in id order.
pub struct Engine {
    ledgers: DashMap<Ulid, SharedLedger>,
    /// Reverse lookup: assignment id → engineer id
    assignment_index: DashMap<Ulid, Ulid>,
    directory: Arc<dyn Directory>,
    pub notify: Arc<NotifyHub>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(directory: Arc<dyn Directory>, notify: Arc<NotifyHub>, config: EngineConfig) -> Self {
        Self {
            ledgers: DashMap::new(),
            assignment_index: DashMap::new(),
            directory,
            notify,
            config,
        }
    }

    pub fn get_ledger(&self, engineer_id: &Ulid) -> Option<SharedLedger> {
        self.ledgers.get(engineer_id).map(|e| e.value().clone())
    }

    pub fn get_engineer_for_assignment(&self, assignment_id: &Ulid) -> Option<Ulid> {
        self.assignment_index.get(assignment_id).map(|e| *e.value())
    }

    /// Get or lazily create an engineer's partition.
    fn ledger_for(&self, engineer_id: Ulid) -> SharedLedger {
        if let Some(ledger) = self.get_ledger(&engineer_id) {
            return ledger;
        }
        let ledger = self
            .ledgers
            .entry(engineer_id)
            .or_insert_with(|| Arc::new(RwLock::new(EngineerLedger::new(engineer_id))))
            .value()
            .clone();
        metrics::gauge!(crate::observability::LEDGER_PARTITIONS).set(self.ledgers.len() as f64);
        ledger
    }

    fn effective_deadline(&self, deadline: Option<Instant>) -> Option<Instant> {
        deadline.or_else(|| self.config.lock_timeout.map(|t| Instant::now() + t))
    }

    /// Enter an engineer's exclusive section. Fails with `DeadlineExceeded`,
    /// having touched nothing, if the deadline passes first.
    pub(super) async fn lock_engineer(
        &self,
        engineer_id: Ulid,
        deadline: Option<Instant>,
    ) -> Result<LedgerWriteGuard, EngineError> {
        let ledger = self.ledger_for(engineer_id);
        let started = Instant::now();
        let guard = match self.effective_deadline(deadline) {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    tracing::warn!(%engineer_id, "deadline already passed, not locking");
                    return Err(EngineError::DeadlineExceeded);
                }
                match tokio::time::timeout_at(deadline, ledger.write_owned()).await {
                    Ok(guard) => guard,
                    Err(_) => {
                        tracing::warn!(%engineer_id, "deadline expired waiting for ledger");
                        return Err(EngineError::DeadlineExceeded);
                    }
                }
            }
            None => ledger.write_owned().await,
        };
        metrics::histogram!(crate::observability::LOCK_WAIT_SECONDS)
            .record(started.elapsed().as_secs_f64());
        Ok(guard)
    }

    /// Lock two engineers in id order to prevent deadlocks. Returns the guards
    /// in argument order.
    pub(super) async fn lock_pair(
        &self,
        a: Ulid,
        b: Ulid,
        deadline: Option<Instant>,
    ) -> Result<(LedgerWriteGuard, LedgerWriteGuard), EngineError> {
        debug_assert_ne!(a, b);
        // Fix the deadline once so both acquisitions share it.
        let deadline = self.effective_deadline(deadline);
        if a < b {
            let ga = self.lock_engineer(a, deadline).await?;
            let gb = self.lock_engineer(b, deadline).await?;
            Ok((ga, gb))
        } else {
            let gb = self.lock_engineer(b, deadline).await?;
            let ga = self.lock_engineer(a, deadline).await?;
            Ok((ga, gb))
        }
    }

    /// Commit + index + notify, under a held write guard.
    pub(super) fn commit_add(&self, guard: &mut EngineerLedger, assignment: Assignment) {
        self.assignment_index
            .insert(assignment.id, assignment.engineer_id);
        guard.add(assignment.clone());
        self.notify.send(&LedgerEvent::AssignmentAdded(assignment));
    }

    pub(super) fn commit_remove(&self, guard: &mut EngineerLedger, id: Ulid) -> Option<Assignment> {
        let removed = guard.remove(id)?;
        self.assignment_index.remove(&id);
        self.notify
            .send(&LedgerEvent::AssignmentRemoved(removed.clone()));
        Some(removed)
    }

    pub(super) async fn engineer(&self, id: Ulid) -> Result<Engineer, EngineError> {
        self.directory
            .engineer(id)
            .await
            .ok_or(EngineError::NotFound(NotFoundError::Engineer(id)))
    }

    pub(super) async fn project(&self, id: Ulid) -> Result<Project, EngineError> {
        self.directory
            .project(id)
            .await
            .ok_or(EngineError::NotFound(NotFoundError::Project(id)))
    }
}
