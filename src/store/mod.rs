//! Configuration store subsystem.
//!
//! # Responsibilities
//! - Hold the base, live and applied configuration trees
//! - Persist the user delta under a single storage key
//! - Decide between a live update and a process restart
//! - Report outcomes to the user as notices
//!
//! # Data Flow
//! ```text
//! defaults + overrides ──▶ base ──▶ current ◀── persisted delta
//!                                     │
//! editor fields ──▶ decode ──▶ diff ──┤
//!                                     ▼
//!                      save: diff(base, current) ──▶ KeyValueStore
//!                            diff(applied, current) ──▶ ReloadPolicy
//!                                                         │
//!                                              RestartTrigger (if needed)
//! ```
//!
//! # Design Decisions
//! - Deltas only add or change leaves; reverting to a default drops the
//!   entry from the persisted delta
//! - Storage and restart failures become notices; the store keeps running
//! - All mutation takes `&mut self`; callers that share a store wrap it in
//!   a mutex

pub mod config_store;
pub mod error;
pub mod notice;
pub mod policy;
pub mod restart;
pub mod storage;

pub use config_store::{
    ChangeEvent, ClearOutcome, Collaborators, ConfigStore, ListenerId, SaveOutcome, StorePhase,
    SubmitOutcome, WatchState,
};
pub use error::StoreError;
pub use notice::{Notice, NoticeLevel, NoticeLog, Notifier};
pub use policy::{needs_reload, ReloadDecision, ReloadPolicy};
pub use restart::{RestartError, RestartRequest, RestartSender, RestartTrigger};
pub use storage::{storage_key, FileStore, KeyValueStore, MemoryStore, StorageError};
