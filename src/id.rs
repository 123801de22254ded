//! Process-unique identifiers for handlers, views and dispatchers.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

static HANDLER_COUNTER: AtomicU64 = AtomicU64::new(0);
static VIEW_COUNTER: AtomicU64 = AtomicU64::new(0);
static DISPATCHER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A unique identifier for a handler instance.
///
/// Ids are assigned sequentially from an atomic counter when a [`HandlerRef`](crate::handler::HandlerRef)
/// is created. The first handler gets id 0, the second 1, and so on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn generate() -> Self {
        HandlerId(HANDLER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the sequential identifier of the handler.
    pub fn sequence_id(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerId({})", self.0)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// A unique identifier for a live view instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn generate() -> Self {
        ViewId(VIEW_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the sequential identifier of the view.
    pub fn sequence_id(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DispatcherId(u64);

impl DispatcherId {
    pub(crate) fn generate() -> Self {
        DispatcherId(DISPATCHER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}
