//! Every authorization decision the engine makes, in one place.

use crate::auth::Identity;
use crate::engine::AuthorizationError;
use crate::model::Project;

pub fn can_create_project(identity: &Identity) -> bool {
    identity.is_manager()
}

/// Managers may only edit projects they own.
pub fn can_update_project(identity: &Identity, project: &Project) -> bool {
    identity.is_manager() && project.manager_id == identity.id
}

pub fn can_create_assignment(identity: &Identity) -> bool {
    identity.is_manager()
}

/// Any manager, or whoever owns the project the assignment belongs to.
pub fn can_manage_assignment(identity: &Identity, project: Option<&Project>) -> bool {
    identity.is_manager() || project.is_some_and(|p| p.manager_id == identity.id)
}

pub fn can_delete_assignment(identity: &Identity) -> bool {
    identity.is_manager()
}

pub(crate) fn require(allowed: bool, denial: AuthorizationError) -> Result<(), AuthorizationError> {
    if allowed { Ok(()) } else { Err(denial) }
}
