//! stackwatch core
//!
//! Reconciliation and polling engine for watching a provisioning stack
//! through create, update and delete operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 stackwatch CLI                   │
//! │               (up / down / watch)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                stackwatch-core                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Watcher (poll → merge → render)          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐  │
//! │  │ Normalizer │ │  Row maps  │ │ Classifier │  │
//! │  └────────────┘ └────────────┘ └────────────┘  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait StackApi { ... }                   │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │ stackwatch-aws│
//!           │  (aws CLI)    │
//!           └───────────────┘
//! ```

pub mod error;
pub mod paginate;
pub mod provider;
pub mod record;
pub mod row;
pub mod rowmap;
pub mod status;
pub mod watch;

// Re-exports
pub use error::{CoreError, Result};
pub use paginate::{Pages, collect_pages};
pub use provider::{AuthStatus, ChangeSetRequest, ChangeSetState, Parameter, StackApi, Tag};
pub use record::{
    Change, ChangeAction, ChangeSetStatus, Replacement, ResourceChange, STACK_RESOURCE_TYPE,
    StackEvent, StackInfo, StackResourceSummary,
};
pub use row::{DisplayRow, RowSource};
pub use rowmap::{
    RowMap, activate, change_map, event_map, first_negative, first_negative_event, merge_events,
    ordered_rows, resource_map,
};
pub use status::{ResourceStatus, StackStatus, StatusClass};
pub use watch::{
    Renderer, RetryConfig, WatchConfig, WatchOutcome, WatchReport, WatchView, Watcher,
};
