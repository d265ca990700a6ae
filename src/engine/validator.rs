use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::ledger::EngineerLedger;
use super::sweep::peak_in_window;
use super::{EngineError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept {
        peak: Percent,
    },
    Reject {
        peak: Percent,
        conflicting: Vec<Ulid>,
    },
}

impl Verdict {
    pub fn into_result(self, max_capacity: Percent) -> Result<Percent, ValidationError> {
        match self {
            Verdict::Accept { peak } => Ok(peak),
            Verdict::Reject { peak, conflicting } => Err(ValidationError::CapacityExceeded {
                peak,
                max_capacity,
                conflicting,
            }),
        }
    }
}

pub(crate) fn validate_window(window: &Window) -> Result<(), EngineError> {
    // The closed end must have a successor for the half-open span.
    if !window.is_valid() || window.end.checked_add(1).is_none() {
        return Err(ValidationError::InvalidRange.into());
    }
    if window.end.saturating_sub(window.start) > MAX_QUERY_WINDOW_MS {
        return Err(EngineError::LimitExceeded("window too wide"));
    }
    Ok(())
}

pub(crate) fn validate_allocation(allocation: Percent) -> Result<(), EngineError> {
    if allocation == 0 || allocation > MAX_ALLOCATION_PERCENT {
        return Err(ValidationError::InvalidAllocation(allocation).into());
    }
    Ok(())
}

pub(crate) fn validate_role_label(role: &str) -> Result<(), EngineError> {
    if role.len() > MAX_ROLE_LABEL_LEN {
        return Err(EngineError::LimitExceeded("role label too long"));
    }
    Ok(())
}

/// Field checks that need no ledger access.
pub(crate) fn validate_fields(assignment: &Assignment) -> Result<(), EngineError> {
    validate_window(&assignment.window())?;
    validate_allocation(assignment.allocation)?;
    validate_role_label(&assignment.role)
}

/// Would committing `allocation` over `proposed` ever push the engineer above
/// `max_capacity`? `exclude` names the assignment being replaced by an update.
///
/// Only instants inside the proposed window can change, so the sweep runs over
/// that window with the proposal added to the existing intervals. The boundary
/// is inclusive: a peak equal to `max_capacity` is accepted.
pub fn validate(
    ledger: &EngineerLedger,
    max_capacity: Percent,
    proposed: &Window,
    allocation: Percent,
    exclude: Option<Ulid>,
) -> Verdict {
    let window = proposed.span();
    let existing = ledger
        .overlapping(&window)
        .filter(|a| Some(a.id) != exclude)
        .map(|a| (a.span(), a.allocation));
    let peak = peak_in_window(existing.chain([(window, allocation)]), &window);

    if peak.value <= max_capacity {
        return Verdict::Accept { peak: peak.value };
    }

    let conflicting = match peak.at {
        Some(t) => ledger.active_at(t, exclude),
        None => Vec::new(),
    };
    Verdict::Reject {
        peak: peak.value,
        conflicting,
    }
}
