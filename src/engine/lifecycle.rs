use tokio::time::Instant;
use tracing::{debug, info};
use ulid::Ulid;

use crate::auth::RequestContext;
use crate::limits::*;
use crate::model::*;
use crate::observability::{self, CAPACITY_REJECTIONS_TOTAL};
use crate::permissions::{self, require};

use super::validator::{validate, validate_fields};
use super::{AuthorizationError, Engine, EngineError, LedgerWriteGuard, NotFoundError};

/// Locked partitions for an update: where the assignment lives now and,
/// if it is moving, where it is going.
struct UpdateSection {
    source: LedgerWriteGuard,
    target: Option<LedgerWriteGuard>,
}

fn finish<T>(op: &'static str, result: Result<T, EngineError>) -> Result<T, EngineError> {
    if let Err(e) = &result {
        if e.is_capacity_exceeded() {
            metrics::counter!(CAPACITY_REJECTIONS_TOTAL).increment(1);
        }
        debug!("{op} rejected: {e}");
    }
    observability::record_op(op, &result, EngineError::label);
    result
}

impl Engine {
    /// Validate and commit a new assignment. On any error the ledger is untouched.
    pub async fn create_assignment(
        &self,
        ctx: &RequestContext,
        new: NewAssignment,
    ) -> Result<Assignment, EngineError> {
        finish("create", self.try_create(ctx, new).await)
    }

    async fn try_create(&self, ctx: &RequestContext, new: NewAssignment) -> Result<Assignment, EngineError> {
        require(
            permissions::can_create_assignment(&ctx.identity),
            AuthorizationError::NotManager,
        )?;
        let assignment = Assignment {
            id: Ulid::new(),
            engineer_id: new.engineer_id,
            project_id: new.project_id,
            allocation: new.allocation,
            start: new.start,
            end: new.end,
            role: new.role,
        };
        validate_fields(&assignment)?;
        let engineer = self.engineer(assignment.engineer_id).await?;
        self.project(assignment.project_id).await?;

        let mut guard = self.lock_engineer(engineer.id, ctx.deadline).await?;
        if guard.len() >= MAX_ASSIGNMENTS_PER_ENGINEER {
            return Err(EngineError::LimitExceeded("too many assignments for engineer"));
        }
        let peak = validate(
            &guard,
            engineer.max_capacity,
            &assignment.window(),
            assignment.allocation,
            None,
        )
        .into_result(engineer.max_capacity)?;

        self.commit_add(&mut guard, assignment.clone());
        info!(
            "assignment {} created: engineer {} at {}% (peak {peak}%/{}%)",
            assignment.id, engineer.id, assignment.allocation, engineer.max_capacity
        );
        Ok(assignment)
    }

    /// Apply a partial update. Changes to dates, allocation or engineer are
    /// re-validated with the assignment's own prior allocation excluded;
    /// label-only changes skip validation.
    pub async fn update_assignment(
        &self,
        ctx: &RequestContext,
        id: Ulid,
        patch: AssignmentPatch,
    ) -> Result<Assignment, EngineError> {
        finish("update", self.try_update(ctx, id, patch).await)
    }

    async fn try_update(
        &self,
        ctx: &RequestContext,
        id: Ulid,
        patch: AssignmentPatch,
    ) -> Result<Assignment, EngineError> {
        let deadline = self.effective_deadline(ctx.deadline);
        let UpdateSection { mut source, target } = self.lock_for_update(id, &patch, deadline).await?;

        let current = source
            .get(id)
            .cloned()
            .ok_or(EngineError::NotFound(NotFoundError::Assignment(id)))?;
        let owning_project = self.directory.project(current.project_id).await;
        require(
            permissions::can_manage_assignment(&ctx.identity, owning_project.as_ref()),
            AuthorizationError::NotOwner,
        )?;

        let proposed = current.patched(&patch);
        if proposed.project_id != current.project_id {
            let new_project = self.project(proposed.project_id).await?;
            require(
                permissions::can_manage_assignment(&ctx.identity, Some(&new_project)),
                AuthorizationError::NotOwner,
            )?;
        }
        validate_fields(&proposed)?;
        if proposed == current {
            return Ok(current);
        }

        match target {
            None => {
                if current.capacity_differs(&proposed) {
                    let engineer = self.engineer(current.engineer_id).await?;
                    validate(
                        &source,
                        engineer.max_capacity,
                        &proposed.window(),
                        proposed.allocation,
                        Some(id),
                    )
                    .into_result(engineer.max_capacity)?;
                }
                source.replace(proposed.clone());
            }
            Some(mut target) => {
                let engineer = self.engineer(proposed.engineer_id).await?;
                if target.len() >= MAX_ASSIGNMENTS_PER_ENGINEER {
                    return Err(EngineError::LimitExceeded("too many assignments for engineer"));
                }
                validate(
                    &target,
                    engineer.max_capacity,
                    &proposed.window(),
                    proposed.allocation,
                    None,
                )
                .into_result(engineer.max_capacity)?;
                source.remove(id);
                target.add(proposed.clone());
                self.assignment_index.insert(id, proposed.engineer_id);
            }
        }

        self.notify.send(&LedgerEvent::AssignmentReplaced {
            previous: current,
            current: proposed.clone(),
        });
        info!(
            "assignment {id} updated: engineer {} at {}%",
            proposed.engineer_id, proposed.allocation
        );
        Ok(proposed)
    }

    /// Lock the partition holding `id` (and the destination partition if the
    /// patch moves it). Retries if the assignment moved while we waited.
    async fn lock_for_update(
        &self,
        id: Ulid,
        patch: &AssignmentPatch,
        deadline: Option<Instant>,
    ) -> Result<UpdateSection, EngineError> {
        loop {
            let engineer_id = self
                .get_engineer_for_assignment(&id)
                .ok_or(EngineError::NotFound(NotFoundError::Assignment(id)))?;
            let target_id = patch.engineer_id.unwrap_or(engineer_id);

            if target_id == engineer_id {
                let source = self.lock_engineer(engineer_id, deadline).await?;
                if source.contains(id) {
                    return Ok(UpdateSection { source, target: None });
                }
            } else {
                if self.directory.engineer(target_id).await.is_none() {
                    return Err(EngineError::NotFound(NotFoundError::Engineer(target_id)));
                }
                let (source, target) = self.lock_pair(engineer_id, target_id, deadline).await?;
                if source.contains(id) {
                    return Ok(UpdateSection {
                        source,
                        target: Some(target),
                    });
                }
            }
            debug!("assignment {id} moved while waiting for its ledger, retrying");
        }
    }

    /// Remove an assignment, restoring its capacity. A second delete of the
    /// same id reports `NotFound` and changes nothing.
    pub async fn delete_assignment(&self, ctx: &RequestContext, id: Ulid) -> Result<Assignment, EngineError> {
        finish("delete", self.try_delete(ctx, id).await)
    }

    async fn try_delete(&self, ctx: &RequestContext, id: Ulid) -> Result<Assignment, EngineError> {
        require(
            permissions::can_delete_assignment(&ctx.identity),
            AuthorizationError::NotManager,
        )?;
        let deadline = self.effective_deadline(ctx.deadline);
        loop {
            let engineer_id = self
                .get_engineer_for_assignment(&id)
                .ok_or(EngineError::NotFound(NotFoundError::Assignment(id)))?;
            let mut guard = self.lock_engineer(engineer_id, deadline).await?;
            if let Some(removed) = self.commit_remove(&mut guard, id) {
                info!("assignment {id} deleted from engineer {engineer_id}");
                return Ok(removed);
            }
        }
    }
}
