use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::bus::{EditEvent, EventBus};
use super::error::{EditError, EditResult, PersistenceError, borrow_state, borrow_state_mut};
use super::field::{FieldBehavior, FieldController, FieldWiring, WeakFieldController};
use super::schedule::DeferredQueue;
use super::validity::{FieldId, ValidityRegistry};

static SESSION_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next() -> Self {
        Self(SESSION_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EditMode {
    #[default]
    Inactive,
    Active,
}

impl EditMode {
    pub fn is_editing(self) -> bool {
        self == EditMode::Active
    }
}

/// What a field does when blank text reaches a commit.
///
/// Both policies refuse the commit and return
/// [`EditError::ContractViolation`]; `Assert` also trips a debug assertion.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ContractPolicy {
    #[default]
    Assert,
    Refuse,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SessionOptions {
    pub initial_mode: EditMode,
    pub contract_policy: ContractPolicy,
}

pub trait Persistence {
    fn save(&mut self) -> Result<(), PersistenceError>;
    fn rollback(&mut self) -> Result<(), PersistenceError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ToolbarState {
    pub primary_label: &'static str,
    pub primary_enabled: bool,
    pub cancel_visible: bool,
    pub back_navigation_hidden: bool,
}

type ModeObserver = Rc<dyn Fn(EditMode)>;

struct SessionState<P> {
    mode: EditMode,
    persistence: P,
}

/// Edit-mode owner for one record.
///
/// Clones share the same session. The session is the only publisher on its
/// event bus; fields created through [`EditSession::text_field`] are wired to
/// its validity registry and bus and to nothing else.
pub struct EditSession<P> {
    id: SessionId,
    options: SessionOptions,
    state: Rc<RefCell<SessionState<P>>>,
    registry: ValidityRegistry,
    bus: EventBus,
    deferred: DeferredQueue,
    fields: Rc<RefCell<Vec<WeakFieldController>>>,
    observers: Rc<RefCell<Vec<ModeObserver>>>,
}

impl<P> Clone for EditSession<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            options: self.options,
            state: self.state.clone(),
            registry: self.registry.clone(),
            bus: self.bus.clone(),
            deferred: self.deferred.clone(),
            fields: self.fields.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<P> EditSession<P>
where
    P: Persistence,
{
    pub fn new(persistence: P, options: SessionOptions) -> Self {
        let id = SessionId::next();
        tracing::debug!(session = %id, mode = ?options.initial_mode, "edit session created");
        Self {
            id,
            options,
            state: Rc::new(RefCell::new(SessionState {
                mode: options.initial_mode,
                persistence,
            })),
            registry: ValidityRegistry::new(),
            bus: EventBus::new(),
            deferred: DeferredQueue::new(),
            fields: Rc::new(RefCell::new(Vec::new())),
            observers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn mode(&self) -> EditResult<EditMode> {
        Ok(borrow_state(&self.state, "reading edit mode")?.mode)
    }

    pub fn is_valid(&self) -> bool {
        self.registry.is_overall_valid()
    }

    pub fn invalid_fields(&self) -> Vec<FieldId> {
        self.registry.invalid_fields()
    }

    pub fn tracked_field_count(&self) -> usize {
        self.registry.len()
    }

    pub fn save_enabled(&self) -> EditResult<bool> {
        Ok(self.mode()?.is_editing() && self.registry.is_overall_valid())
    }

    pub fn toolbar(&self) -> EditResult<ToolbarState> {
        let mode = self.mode()?;
        Ok(ToolbarState {
            primary_label: if mode.is_editing() { "Done" } else { "Edit" },
            primary_enabled: !mode.is_editing() || self.registry.is_overall_valid(),
            cancel_visible: mode.is_editing(),
            back_navigation_hidden: mode.is_editing(),
        })
    }

    pub fn deferred(&self) -> &DeferredQueue {
        &self.deferred
    }

    pub fn live_field_count(&self) -> usize {
        self.prune_fields();
        self.fields.borrow().len()
    }

    pub fn with_persistence<R>(&self, f: impl FnOnce(&P) -> R) -> EditResult<R> {
        let state = borrow_state(&self.state, "reading persistence collaborator")?;
        Ok(f(&state.persistence))
    }

    pub fn on_mode_change(&self, observer: impl Fn(EditMode) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    pub fn text_field(
        &self,
        id: impl Into<FieldId>,
        initial: impl Into<String>,
        behavior: FieldBehavior,
    ) -> EditResult<FieldController> {
        let id = id.into();
        self.prune_fields();
        let duplicate = self
            .fields
            .borrow()
            .iter()
            .filter_map(WeakFieldController::upgrade)
            .any(|field| field.id() == &id);
        if duplicate {
            return Err(EditError::DuplicateField { field: id });
        }

        let controller = FieldController::attach(
            id,
            initial,
            behavior,
            FieldWiring {
                registry: self.registry.clone(),
                bus: self.bus.clone(),
                contract_policy: self.options.contract_policy,
                accepts_input: self.mode()?.is_editing(),
            },
        );
        self.fields.borrow_mut().push(controller.downgrade());
        tracing::debug!(session = %self.id, field = %controller.id(), "field attached");
        Ok(controller)
    }

    pub fn begin_edit(&self) -> EditResult<()> {
        {
            let mut state = borrow_state_mut(&self.state, "beginning edit")?;
            require_mode(&state, EditMode::Inactive, "begin editing")?;
            state.mode = EditMode::Active;
        }
        tracing::debug!(session = %self.id, "edit began");
        self.mode_changed(EditMode::Active);
        Ok(())
    }

    pub fn request_cancel(&self) -> EditResult<()> {
        {
            let mut state = borrow_state_mut(&self.state, "cancelling edit")?;
            require_mode(&state, EditMode::Active, "cancel editing")?;
            state.persistence.rollback()?;
            let report = self.bus.publish(EditEvent::CancelRequested);
            for (field, error) in &report.failures {
                tracing::warn!(
                    session = %self.id,
                    field = %field,
                    %error,
                    "field failed to revert"
                );
            }
            for field in self.live_fields() {
                if field.revert_after_cancel() {
                    tracing::debug!(
                        session = %self.id,
                        field = %field.id(),
                        "reverted local commit"
                    );
                }
            }
            self.registry.reset();
            state.mode = EditMode::Inactive;
        }
        tracing::debug!(session = %self.id, "edit cancelled");
        self.mode_changed(EditMode::Inactive);
        Ok(())
    }

    pub fn request_save(&self) -> EditResult<()> {
        {
            let mut state = borrow_state_mut(&self.state, "saving edit")?;
            require_mode(&state, EditMode::Active, "save")?;
            if !self.registry.is_overall_valid() {
                let invalid = self.registry.invalid_fields();
                tracing::debug!(session = %self.id, ?invalid, "save rejected");
                return Err(EditError::SaveDisabled { invalid });
            }

            let report = self.bus.publish(EditEvent::CommitRequested);
            if let Some((_, error)) = report.failures.into_iter().next() {
                return Err(error);
            }
            if let Err(error) = state.persistence.save() {
                tracing::warn!(session = %self.id, %error, "save failed, session stays active");
                return Err(error.into());
            }
            for field in self.live_fields() {
                field.settle_after_save();
            }
            self.registry.reset();
            state.mode = EditMode::Inactive;
        }
        tracing::debug!(session = %self.id, "edit saved");
        self.mode_changed(EditMode::Inactive);
        Ok(())
    }

    pub fn toggle_edit(&self) -> EditResult<()> {
        match self.mode()? {
            EditMode::Inactive => self.begin_edit(),
            EditMode::Active => self.request_save(),
        }
    }

    fn mode_changed(&self, mode: EditMode) {
        let mut deferred = self.deferred.clone();
        for field in self.live_fields() {
            field.sync_input_enabled(mode, &mut deferred);
        }

        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(mode);
        }
    }

    fn live_fields(&self) -> Vec<FieldController> {
        self.prune_fields();
        self.fields
            .borrow()
            .iter()
            .filter_map(WeakFieldController::upgrade)
            .collect()
    }

    fn prune_fields(&self) {
        self.fields
            .borrow_mut()
            .retain(|field| field.upgrade().is_some());
    }
}

fn require_mode<P>(
    state: &SessionState<P>,
    required: EditMode,
    action: &'static str,
) -> EditResult<()> {
    if state.mode == required {
        Ok(())
    } else {
        Err(EditError::InvalidModeTransition {
            mode: state.mode,
            action,
        })
    }
}
