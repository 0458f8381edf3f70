//! Resumable cooking progress: a persisted per-recipe state machine plus
//! best-effort sync of completion state to the remote cook history.

pub mod machine;
pub mod store;
pub mod sync;

pub use machine::{
    preferred_language, resume, CookingSession, CookingState, ProgressRecord, ResumePoint,
    SessionSnapshot, StoredRecipe, SyncRequest, Transition,
};
pub use store::{JsonFileStore, MemoryStore, ProgressStore, StorageKey, StoreError};
pub use sync::{dispatch, sync_transition, CookHistoryApi, SyncOutcome};
