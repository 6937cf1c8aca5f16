use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gpui::SharedString;

use super::bus::{EditEvent, EventBus, SubscriptionHandle};
use super::error::{EditError, EditResult};
use super::schedule::TaskScheduler;
use super::session::{ContractPolicy, EditMode};
use super::text::{TextBuffer, TextEdit};
use super::validity::{FieldId, ValidityRegistry};

type TextPredicate = Rc<dyn Fn(&str) -> bool>;
type TextCallback = Rc<dyn Fn(&str)>;

/// The three capabilities a field contributes to an edit session.
///
/// `validate` must be pure: it runs on every keystroke against the text the
/// keystroke would produce.
#[derive(Clone)]
pub struct FieldBehavior {
    validate: TextPredicate,
    commit: TextCallback,
    revert: TextCallback,
}

impl FieldBehavior {
    pub fn new(validate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            validate: Rc::new(validate),
            commit: Rc::new(|_: &str| {}),
            revert: Rc::new(|_: &str| {}),
        }
    }

    pub fn non_blank() -> Self {
        Self::new(is_non_blank)
    }

    pub fn on_commit(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.commit = Rc::new(handler);
        self
    }

    pub fn on_revert(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.revert = Rc::new(handler);
        self
    }

    pub fn validate(&self, text: &str) -> bool {
        (self.validate)(text)
    }
}

pub fn is_non_blank(text: &str) -> bool {
    !text.trim().is_empty()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldState {
    Idle,
    Editing,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndEditing {
    Committed,
    Rejected,
    NotEditing,
}

struct FieldInner {
    snapshot: String,
    buffer: TextBuffer,
    state: FieldState,
    subscription: Option<SubscriptionHandle>,
    accepts_input: bool,
    committed_in_session: bool,
}

struct FieldCore {
    id: FieldId,
    behavior: FieldBehavior,
    registry: ValidityRegistry,
    bus: EventBus,
    contract_policy: ContractPolicy,
    inner: RefCell<FieldInner>,
}

impl Drop for FieldCore {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.get_mut().subscription.take() {
            self.bus.unsubscribe(handle);
        }
    }
}

/// Per-field edit state machine.
///
/// Holds the live text of one field, reports its validity on every edit and
/// reacts to the session's commit and cancel broadcasts while editing.
#[derive(Clone)]
pub struct FieldController {
    core: Rc<FieldCore>,
}

pub(crate) struct FieldWiring {
    pub(crate) registry: ValidityRegistry,
    pub(crate) bus: EventBus,
    pub(crate) contract_policy: ContractPolicy,
    pub(crate) accepts_input: bool,
}

impl FieldController {
    pub(crate) fn attach(
        id: FieldId,
        initial: impl Into<String>,
        behavior: FieldBehavior,
        wiring: FieldWiring,
    ) -> Self {
        let initial = initial.into();
        Self {
            core: Rc::new(FieldCore {
                id,
                behavior,
                registry: wiring.registry,
                bus: wiring.bus,
                contract_policy: wiring.contract_policy,
                inner: RefCell::new(FieldInner {
                    buffer: TextBuffer::new(initial.clone()),
                    snapshot: initial,
                    state: FieldState::Idle,
                    subscription: None,
                    accepts_input: wiring.accepts_input,
                    committed_in_session: false,
                }),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakFieldController {
        WeakFieldController {
            core: Rc::downgrade(&self.core),
        }
    }

    pub fn id(&self) -> &FieldId {
        &self.core.id
    }

    pub fn text(&self) -> String {
        self.core.inner.borrow().buffer.text().to_owned()
    }

    pub fn display_text(&self) -> SharedString {
        self.text().into()
    }

    pub fn snapshot(&self) -> String {
        self.core.inner.borrow().snapshot.clone()
    }

    pub fn state(&self) -> FieldState {
        self.core.inner.borrow().state
    }

    pub fn is_editing(&self) -> bool {
        self.state() == FieldState::Editing
    }

    pub fn is_subscribed(&self) -> bool {
        self.core
            .inner
            .borrow()
            .subscription
            .is_some_and(|handle| self.core.bus.is_subscribed(handle))
    }

    pub fn accepts_input(&self) -> bool {
        self.core.inner.borrow().accepts_input
    }

    pub fn focus(&self) -> EditResult<()> {
        self.ensure_accepts_input()?;
        self.begin_editing();
        Ok(())
    }

    /// Applies one edit and returns whether the resulting text is valid.
    ///
    /// The edit is applied even when the result is invalid.
    pub fn apply_edit(&self, edit: &TextEdit) -> EditResult<bool> {
        self.ensure_accepts_input()?;
        self.begin_editing();

        let proposed = self.core.inner.borrow().buffer.proposed(edit);
        let valid = self.core.behavior.validate(&proposed);
        self.core.registry.set_valid(self.core.id.clone(), valid);
        self.core.inner.borrow_mut().buffer.apply(edit);
        Ok(valid)
    }

    pub fn insert_text(&self, text: &str) -> EditResult<bool> {
        let edit = self.core.inner.borrow().buffer.insert_at_caret(text);
        self.apply_edit(&edit)
    }

    pub fn delete_backward(&self) -> EditResult<bool> {
        let edit = self.core.inner.borrow().buffer.delete_backward();
        match edit {
            Some(edit) => self.apply_edit(&edit),
            None => self.focus().map(|_| self.should_end_editing()),
        }
    }

    pub fn delete_forward(&self) -> EditResult<bool> {
        let edit = self.core.inner.borrow().buffer.delete_forward();
        match edit {
            Some(edit) => self.apply_edit(&edit),
            None => self.focus().map(|_| self.should_end_editing()),
        }
    }

    pub fn caret(&self) -> usize {
        self.core.inner.borrow().buffer.caret()
    }

    /// Moves the caret to `char_index`, clamped to the text length. Caret
    /// movement is navigation, not input, so it neither focuses the field
    /// nor requires `accepts_input`.
    pub fn move_caret(&self, char_index: usize) {
        self.core.inner.borrow_mut().buffer.move_caret(char_index);
    }

    pub fn replace_text(&self, text: &str) -> EditResult<bool> {
        self.apply_edit(&TextEdit::replace_all(text))
    }

    pub fn should_end_editing(&self) -> bool {
        let text = self.text();
        self.core.behavior.validate(&text)
    }

    /// Ends input from the field itself (submit key or focus loss).
    ///
    /// Valid text is committed locally; invalid text keeps the field editing.
    pub fn end_editing(&self) -> EditResult<EndEditing> {
        if !self.is_editing() {
            return Ok(EndEditing::NotEditing);
        }
        let text = self.text();
        if !self.core.behavior.validate(&text) {
            self.core.registry.set_valid(self.core.id.clone(), false);
            tracing::debug!(field = %self.core.id, "end of input rejected by validation");
            return Ok(EndEditing::Rejected);
        }
        self.commit_current()?;
        Ok(EndEditing::Committed)
    }

    /// Schedules the `accepts_input` update for `mode` on the next tick.
    pub fn sync_input_enabled(&self, mode: EditMode, scheduler: &mut impl TaskScheduler) {
        let weak = Rc::downgrade(&self.core);
        let enabled = mode.is_editing();
        scheduler.schedule(Box::new(move || {
            if let Some(core) = weak.upgrade() {
                core.inner.borrow_mut().accepts_input = enabled;
            }
        }));
    }

    fn ensure_accepts_input(&self) -> EditResult<()> {
        if self.accepts_input() {
            Ok(())
        } else {
            Err(EditError::InputDisabled {
                field: self.core.id.clone(),
            })
        }
    }

    fn begin_editing(&self) {
        if self.is_editing() {
            return;
        }
        let weak = Rc::downgrade(&self.core);
        let handle = self.core.bus.subscribe(self.core.id.clone(), move |event| {
            match weak.upgrade() {
                Some(core) => FieldController { core }.handle_event(event),
                None => Ok(()),
            }
        });
        {
            let mut inner = self.core.inner.borrow_mut();
            inner.subscription = Some(handle);
            inner.state = FieldState::Editing;
        }
        let valid = self.should_end_editing();
        self.core.registry.set_valid(self.core.id.clone(), valid);
        tracing::trace!(field = %self.core.id, valid, "field began editing");
    }

    fn handle_event(&self, event: EditEvent) -> EditResult<()> {
        if !self.is_editing() {
            return Ok(());
        }
        match event {
            EditEvent::CommitRequested => self.commit_current(),
            EditEvent::CancelRequested => {
                self.revert();
                Ok(())
            }
        }
    }

    fn commit_current(&self) -> EditResult<()> {
        let text = self.text();
        self.finish_editing();
        if !is_non_blank(&text) {
            return Err(self.contract_violation("blank text reached commit"));
        }
        self.core.inner.borrow_mut().committed_in_session = true;
        (self.core.behavior.commit)(&text);
        tracing::debug!(field = %self.core.id, "field committed");
        Ok(())
    }

    fn revert(&self) {
        let snapshot = self.snapshot();
        self.finish_editing();
        {
            let mut inner = self.core.inner.borrow_mut();
            inner.buffer.set_text(snapshot.clone());
            inner.committed_in_session = false;
        }
        (self.core.behavior.revert)(&snapshot);
        tracing::debug!(field = %self.core.id, "field reverted");
    }

    /// Promotes text committed during a saved session to the snapshot that
    /// later cancels revert to.
    pub(crate) fn settle_after_save(&self) {
        let mut guard = self.core.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.committed_in_session {
            inner.snapshot = inner.buffer.text().to_owned();
            inner.committed_in_session = false;
        }
    }

    /// Reverts a field that committed and went Idle before the session was
    /// cancelled. Returns whether anything was reverted.
    pub(crate) fn revert_after_cancel(&self) -> bool {
        let pending = {
            let inner = self.core.inner.borrow();
            inner.committed_in_session && inner.state == FieldState::Idle
        };
        if pending {
            self.revert();
        }
        pending
    }

    fn finish_editing(&self) {
        let handle = {
            let mut inner = self.core.inner.borrow_mut();
            inner.state = FieldState::Idle;
            inner.subscription.take()
        };
        if let Some(handle) = handle {
            self.core.bus.unsubscribe(handle);
        }
    }

    fn contract_violation(&self, reason: &'static str) -> EditError {
        tracing::error!(field = %self.core.id, reason, "field contract violated");
        debug_assert!(
            self.core.contract_policy != ContractPolicy::Assert,
            "field `{}`: {reason}",
            self.core.id
        );
        EditError::ContractViolation {
            field: self.core.id.clone(),
            reason,
        }
    }
}

#[derive(Clone)]
pub(crate) struct WeakFieldController {
    core: Weak<FieldCore>,
}

impl WeakFieldController {
    pub(crate) fn upgrade(&self) -> Option<FieldController> {
        self.core.upgrade().map(|core| FieldController { core })
    }
}
