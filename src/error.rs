//! Defines error handling constructs for waypoint.
//!
//! Errors fall into three groups. [`RouteError`] is raised while building a route table, [`ViewError`]
//! while mapping or instantiating views, and [`NavigationError`] covers everything that can end a single
//! navigation. Navigation errors are never returned to the caller of
//! [`Dispatcher::navigate`](crate::dispatcher::Dispatcher::navigate); they are reported to the
//! [`Host`](crate::dispatcher::Host) through its `on_load_failed` hook and surfaced on the
//! [`Navigation`](crate::dispatcher::Navigation) handle.

use std::{any::Any, error, fmt, sync::Arc};

use crate::view::{ModelType, ViewPerspectiveKey};

/// A dyn boxed error.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// An error that can occur when registering routes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// A route with an identical pattern is already registered.
    #[error("route '{pattern}' is already registered")]
    DuplicateRoute {
        /// The duplicated pattern.
        pattern: String,
    },
    /// The pattern could not be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}

/// An error that can occur when mapping, creating or updating views.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// No view type is registered for the perspective.
    #[error("no view registered for perspective {key}")]
    UnmappedPerspective {
        /// The perspective that has no view.
        key: ViewPerspectiveKey,
    },
    /// The perspective is mapped by an instance registration only, so no further views can be built for it.
    #[error("view for perspective {key} was registered as an instance and cannot be constructed")]
    NotConstructible {
        /// The perspective that has no factory.
        key: ViewPerspectiveKey,
    },
    /// A model or view did not have the expected model type.
    #[error("model type mismatch: expected {expected}, found {found}")]
    ModelMismatch {
        /// The model type the view works with.
        expected: ModelType,
        /// The model type that was supplied.
        found: ModelType,
    },
}

/// An error that ends a single navigation.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    /// No route matches the url.
    #[error("no route matches '{url}'")]
    RouteNotFound {
        /// The url that failed to resolve.
        url: String,
    },
    /// The handler produced a perspective that could not be shown.
    #[error(transparent)]
    View(#[from] ViewError),
    /// The handler returned an error from its load step.
    #[error("handler {handler} failed to load: {source}")]
    LoadFailed {
        /// Name of the failing handler.
        handler: &'static str,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },
    /// The handler panicked in its load step.
    #[error("handler {handler} {panic}")]
    LoadPanicked {
        /// Name of the panicking handler.
        handler: &'static str,
        /// The captured panic.
        panic: PanicError,
    },
    /// A synchronous redirect targeted a handler that is still loading further up the same chain.
    #[error("handler {handler} is already loading in this navigation chain")]
    ReentrantLoad {
        /// Name of the busy handler.
        handler: &'static str,
    },
}

impl NavigationError {
    /// Returns `true` if the error is [`ViewError::UnmappedPerspective`].
    pub fn is_unmapped_perspective(&self) -> bool {
        matches!(
            self,
            NavigationError::View(ViewError::UnmappedPerspective { .. })
        )
    }
}

/// A shared error describing a panic that occured inside a handler's load step.
#[derive(Clone)]
pub struct PanicError(Arc<str>);

impl PanicError {
    /// Creates a new PanicError with a message.
    pub fn new(msg: impl Into<Arc<str>>) -> Self {
        PanicError(msg.into())
    }

    /// Creates a PanicError from a panic payload returned by `catch_unwind`.
    pub fn new_from_panic_any(payload: Box<dyn Any + Send>) -> Self {
        // Types are strings if panicked with the `std::panic!` macro
        let msg = payload
            .downcast_ref::<&'static str>()
            .map(|s| Arc::from(*s))
            .or_else(|| payload.downcast_ref::<String>().map(|s| Arc::from(s.as_str())))
            .unwrap_or_else(|| Arc::from(""));
        PanicError(msg)
    }

    /// The panic message, if the payload was a string.
    pub fn message(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(&self.0)
        }
    }
}

impl fmt::Debug for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicError").field(&self.message()).finish()
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "panicked: {msg}"),
            None => write!(f, "panicked"),
        }
    }
}

impl error::Error for PanicError {}
