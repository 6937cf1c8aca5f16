use std::cell::{Ref, RefCell, RefMut};

use thiserror::Error;

use super::session::EditMode;
use super::validity::FieldId;

/// Failure reported by a [`Persistence`](super::Persistence) collaborator.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum PersistenceError {
    #[error("failed to save record: {0}")]
    SaveFailed(String),
    #[error("failed to roll back record: {0}")]
    RollbackFailed(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EditError {
    #[error("cannot {action} while session is {mode:?}")]
    InvalidModeTransition {
        mode: EditMode,
        action: &'static str,
    },
    #[error("save is disabled: {} field(s) hold invalid input", .invalid.len())]
    SaveDisabled { invalid: Vec<FieldId> },
    #[error("field `{field}` is not accepting input")]
    InputDisabled { field: FieldId },
    #[error("field `{field}` is already registered in this session")]
    DuplicateField { field: FieldId },
    #[error("contract violation on field `{field}`: {reason}")]
    ContractViolation { field: FieldId, reason: &'static str },
    #[error("re-entrant update while {0}")]
    ReentrantUpdate(&'static str),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type EditResult<T> = Result<T, EditError>;

pub(crate) fn borrow_state<'a, T>(
    cell: &'a RefCell<T>,
    context: &'static str,
) -> EditResult<Ref<'a, T>> {
    cell.try_borrow()
        .map_err(|_| EditError::ReentrantUpdate(context))
}

pub(crate) fn borrow_state_mut<'a, T>(
    cell: &'a RefCell<T>,
    context: &'static str,
) -> EditResult<RefMut<'a, T>> {
    cell.try_borrow_mut()
        .map_err(|_| EditError::ReentrantUpdate(context))
}
