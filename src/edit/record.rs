use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use gpui::SharedString;
use rust_decimal::Decimal;

use super::error::{EditResult, PersistenceError};
use super::field::{FieldBehavior, FieldController, is_non_blank};
use super::session::{EditSession, Persistence};
use super::validity::FieldId;

pub trait FieldLens<T>: Copy + 'static {
    type Value: Clone + PartialEq + 'static;

    fn key(self) -> FieldId;
    fn get<'a>(self, record: &'a T) -> &'a Self::Value;
    fn set(self, record: &mut T, value: Self::Value);
}

pub trait EditableRecord: Clone + 'static {
    type Fields;

    fn fields() -> Self::Fields;
}

type SaveHook<T> = Box<dyn Fn(&T) -> Result<(), PersistenceError>>;

struct StoreState<T> {
    committed: T,
    working: T,
    save_count: u32,
    rollback_count: u32,
    on_save: Option<SaveHook<T>>,
}

/// In-memory persistence for one record.
///
/// Field commits write into the working copy; `save` promotes it to the
/// committed copy and `rollback` discards it.
pub struct RecordStore<T> {
    state: Rc<RefCell<StoreState<T>>>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> RecordStore<T>
where
    T: Clone + 'static,
{
    pub fn new(record: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(StoreState {
                committed: record.clone(),
                working: record,
                save_count: 0,
                rollback_count: 0,
                on_save: None,
            })),
        }
    }

    /// Runs `hook` against the working copy before it is committed. A hook
    /// error aborts the save and leaves the committed copy untouched.
    pub fn on_save(self, hook: impl Fn(&T) -> Result<(), PersistenceError> + 'static) -> Self {
        self.state.borrow_mut().on_save = Some(Box::new(hook));
        self
    }

    pub fn committed(&self) -> T {
        self.state.borrow().committed.clone()
    }

    pub fn working(&self) -> T {
        self.state.borrow().working.clone()
    }

    pub fn save_count(&self) -> u32 {
        self.state.borrow().save_count
    }

    pub fn rollback_count(&self) -> u32 {
        self.state.borrow().rollback_count
    }

    pub fn get<L>(&self, lens: L) -> L::Value
    where
        L: FieldLens<T>,
    {
        lens.get(&self.state.borrow().working).clone()
    }

    pub fn set<L>(&self, lens: L, value: L::Value)
    where
        L: FieldLens<T>,
    {
        lens.set(&mut self.state.borrow_mut().working, value);
    }

    pub fn is_dirty(&self) -> bool
    where
        T: PartialEq,
    {
        let state = self.state.borrow();
        state.working != state.committed
    }

    pub fn text_behavior<L>(&self, lens: L) -> FieldBehavior
    where
        L: FieldLens<T, Value = SharedString>,
    {
        self.text_behavior_with(lens, is_non_blank)
    }

    pub fn text_behavior_with<L>(
        &self,
        lens: L,
        validate: impl Fn(&str) -> bool + 'static,
    ) -> FieldBehavior
    where
        L: FieldLens<T, Value = SharedString>,
    {
        let commit_store = self.clone();
        let revert_store = self.clone();
        FieldBehavior::new(validate)
            .on_commit(move |text| commit_store.set(lens, SharedString::from(text.to_owned())))
            .on_revert(move |previous| {
                revert_store.set(lens, SharedString::from(previous.to_owned()))
            })
    }

    pub fn decimal_behavior<L>(&self, lens: L) -> FieldBehavior
    where
        L: FieldLens<T, Value = Decimal>,
    {
        let commit_store = self.clone();
        let revert_store = self.clone();
        FieldBehavior::new(|text| parse_decimal(text).is_some())
            .on_commit(move |text| match parse_decimal(text) {
                Some(value) => commit_store.set(lens, value),
                None => tracing::warn!(field = %lens.key(), "unparsable decimal reached commit"),
            })
            .on_revert(move |_| {
                let committed = lens.get(&revert_store.state.borrow().committed).clone();
                revert_store.set(lens, committed);
            })
    }
}

impl<T> Persistence for RecordStore<T>
where
    T: Clone + 'static,
{
    fn save(&mut self) -> Result<(), PersistenceError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Some(hook) = &state.on_save {
            hook(&state.working)?;
        }
        state.committed = state.working.clone();
        state.save_count += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PersistenceError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.working = state.committed.clone();
        state.rollback_count += 1;
        Ok(())
    }
}

impl<T> EditSession<RecordStore<T>>
where
    T: Clone + 'static,
{
    pub fn bind_text<L>(&self, lens: L) -> EditResult<FieldController>
    where
        L: FieldLens<T, Value = SharedString>,
    {
        let store = self.with_persistence(RecordStore::clone)?;
        let initial = store.get(lens).to_string();
        self.text_field(lens.key(), initial, store.text_behavior(lens))
    }

    pub fn bind_text_with<L>(
        &self,
        lens: L,
        validate: impl Fn(&str) -> bool + 'static,
    ) -> EditResult<FieldController>
    where
        L: FieldLens<T, Value = SharedString>,
    {
        let store = self.with_persistence(RecordStore::clone)?;
        let initial = store.get(lens).to_string();
        self.text_field(lens.key(), initial, store.text_behavior_with(lens, validate))
    }

    pub fn bind_decimal<L>(&self, lens: L) -> EditResult<FieldController>
    where
        L: FieldLens<T, Value = Decimal>,
    {
        let store = self.with_persistence(RecordStore::clone)?;
        let initial = store.get(lens).to_string();
        self.text_field(lens.key(), initial, store.decimal_behavior(lens))
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}
