//! Forward-only record cursors
//!
//! Each cursor is a small state machine over [`CursorState`]:
//!
//! ```text
//! NotStarted ──first()──► At(ptr) ──next(ptr)──► At(ptr') ...
//!      │                     │
//!      └──── None ───────────┴──────► Exhausted (permanent)
//! ```
//!
//! Once exhausted, `advance` returns `None` without calling the engine.
//! All cursors are `Iterator`s over [`RecordHandle`]s borrowed from the
//! instance.
//!
//! [`RecordHandle`]: crate::RecordHandle

mod find;
mod parent;
mod sequential;

pub use find::FindCursor;
pub(crate) use find::zero_based_column;
pub use parent::ParentCursor;
pub use sequential::RecordCursor;

use wgbind_core::RecordPtr;

/// Position of a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorState {
    NotStarted,
    At(RecordPtr),
    Exhausted,
}

impl CursorState {
    /// Move to the next position using `first` (from the start) or `next`
    /// (from the current record)
    pub(crate) fn step<F, N>(&mut self, first: F, next: N) -> Option<RecordPtr>
    where
        F: FnOnce() -> Option<RecordPtr>,
        N: FnOnce(RecordPtr) -> Option<RecordPtr>,
    {
        let found = match *self {
            CursorState::NotStarted => first(),
            CursorState::At(current) => next(current),
            CursorState::Exhausted => return None,
        };
        *self = match found {
            Some(ptr) => CursorState::At(ptr),
            None => CursorState::Exhausted,
        };
        found
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        matches!(self, CursorState::Exhausted)
    }
}
