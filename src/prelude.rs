pub use crate::edit::{
    ContractPolicy, EditError, EditMode, EditResult, EditSession, EditableRecord, EndEditing,
    FieldBehavior, FieldController, FieldId, FieldLens, FieldState, Persistence, PersistenceError,
    RecordStore, SessionOptions, TaskScheduler, TextEdit, ToolbarState,
};
