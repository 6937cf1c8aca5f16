mod bus;
mod error;
mod field;
mod record;
mod schedule;
mod session;
mod text;
mod validity;


pub use bus::{DeliveryReport, EditEvent, EventBus, SubscriptionHandle};
pub use error::{EditError, EditResult, PersistenceError};
pub use field::{EndEditing, FieldBehavior, FieldController, FieldState, is_non_blank};
pub use lockstep_derive::EditableRecord;
pub use record::{EditableRecord, FieldLens, RecordStore};
pub use schedule::{DeferredQueue, DeferredTask, TaskScheduler};
pub use session::{
    ContractPolicy, EditMode, EditSession, Persistence, SessionId, SessionOptions, ToolbarState,
};
pub use text::{TextBuffer, TextEdit};
pub use validity::{FieldId, ValidityRegistry};
