use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use gpui::SharedString;

#[derive(Clone, Debug)]
pub struct FieldId(SharedString);

impl FieldId {
    pub fn new(value: impl Into<SharedString>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl PartialEq for FieldId {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for FieldId {}

impl Hash for FieldId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for FieldId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Display for FieldId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for FieldId {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Per-field validity flags for one edit session.
///
/// A field that never reported is valid. The handle is cheap to clone; every
/// clone observes the same flags.
#[derive(Clone, Debug, Default)]
pub struct ValidityRegistry {
    states: Rc<RefCell<HashMap<FieldId, bool>>>,
}

impl ValidityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_valid(&self, id: FieldId, valid: bool) {
        tracing::trace!(field = %id, valid, "recording field validity");
        self.states.borrow_mut().insert(id, valid);
    }

    pub fn is_valid(&self, id: &FieldId) -> bool {
        self.states.borrow().get(id).copied().unwrap_or(true)
    }

    pub fn is_overall_valid(&self) -> bool {
        self.states.borrow().values().all(|valid| *valid)
    }

    pub fn invalid_fields(&self) -> Vec<FieldId> {
        let mut invalid = self
            .states
            .borrow()
            .iter()
            .filter_map(|(id, valid)| (!valid).then(|| id.clone()))
            .collect::<Vec<_>>();
        invalid.sort();
        invalid
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.borrow().is_empty()
    }

    pub fn reset(&self) {
        self.states.borrow_mut().clear();
    }
}
