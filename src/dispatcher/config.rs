use serde::{Deserialize, Serialize};

/// How loads started by one dispatcher are serialized.
///
/// The dispatcher always holds a lock while it hands a load to the worker pool. Handing off does not wait
/// for the load, so under [`LoadSerialization::EnqueueOnly`] two navigations issued back to back run their
/// loads concurrently on different workers (loads targeting the same handler still wait for each other).
/// [`LoadSerialization::PerDispatcher`] additionally holds a per-dispatcher lock for the whole load and
/// completion, so at most one navigation of the dispatcher is in flight. Redirects issued synchronously from
/// inside a load run under the lock already held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSerialization {
    /// Only the hand-off to the worker pool is serialized.
    EnqueueOnly,
    /// Loads run one at a time per dispatcher.
    PerDispatcher,
}

/// The default load serialization policy: hand-off only, loads may overlap.
pub const DEFAULT_LOAD_SERIALIZATION: LoadSerialization = LoadSerialization::EnqueueOnly;

impl Default for LoadSerialization {
    fn default() -> Self {
        DEFAULT_LOAD_SERIALIZATION
    }
}

/// Which navigations a cancellation applies to.
///
/// Under [`CancelScope::Dispatcher`] there is one cancel flag per dispatcher, shared by every navigation that
/// is not a redirect. Each such navigation resets it when its load is scheduled and again when its load
/// finishes, so with overlapping navigations a redirect in one can suppress the completion of another, and a
/// navigation starting can clear a pending cancellation. Navigations started by a redirect always get their
/// own flag. [`CancelScope::Navigation`] gives every navigation its own flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelScope {
    /// One flag shared by all navigations of a dispatcher.
    Dispatcher,
    /// One flag per navigation.
    Navigation,
}

/// The default cancel scope: one flag per dispatcher.
pub const DEFAULT_CANCEL_SCOPE: CancelScope = CancelScope::Dispatcher;

impl Default for CancelScope {
    fn default() -> Self {
        DEFAULT_CANCEL_SCOPE
    }
}

/// Configuration of a [`Dispatcher`](super::Dispatcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Run loads on the tokio runtime instead of inline on the navigating task.
    pub threaded: bool,
    /// Reject duplicate route registrations instead of ignoring them.
    pub strict_routes: bool,
    /// See [`LoadSerialization`].
    pub load_serialization: LoadSerialization,
    /// See [`CancelScope`].
    pub cancel_scope: CancelScope,
}

impl DispatcherConfig {
    /// The default configuration with loads running inline on the navigating task.
    pub fn synchronous() -> Self {
        DispatcherConfig {
            threaded: false,
            ..Default::default()
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            threaded: true,
            strict_routes: true,
            load_serialization: DEFAULT_LOAD_SERIALIZATION,
            cancel_scope: DEFAULT_CANCEL_SCOPE,
        }
    }
}
