//! Handlers load models and pick the perspective they are displayed through.
//!
//! A [`Handler`] is the application logic behind a route. Each navigation that resolves to it calls
//! [`Handler::load`] with the merged navigation parameters; the handler updates its model and returns the
//! [`Perspective`] the model should be shown in. Handlers are wrapped in a [`HandlerRef`], which is bound to
//! routes and carries the handler's lifecycle record between navigations: the [`ViewEntry`] of its last
//! navigation and the view it was last presented in.
//!
//! # Example
//!
//! ```
//! use waypoint::error::BoxError;
//! use waypoint::handler::{Handler, HandlerRef, LoadContext};
//! use waypoint::route::Parameters;
//! use waypoint::view::Perspective;
//!
//! #[derive(Clone)]
//! struct Customer {
//!     id: String,
//! }
//!
//! #[derive(Default)]
//! struct CustomerHandler {
//!     customer: Option<Customer>,
//! }
//!
//! impl Handler for CustomerHandler {
//!     type Model = Customer;
//!
//!     async fn load(&mut self, params: &Parameters, _ctx: &LoadContext) -> Result<Perspective, BoxError> {
//!         let id = params.get("id").ok_or("missing id")?;
//!         self.customer = Some(Customer { id: id.clone() });
//!         Ok(Perspective::READ)
//!     }
//!
//!     fn model(&self) -> Option<Customer> {
//!         self.customer.clone()
//!     }
//! }
//!
//! let handler = HandlerRef::new(CustomerHandler::default());
//! assert!(handler.view_entry().is_none());
//! ```

use std::{
    any::{self, Any},
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    dispatcher::{CancelFlag, Dispatcher, Navigation},
    error::BoxError,
    id::HandlerId,
    route::Parameters,
    view::{AnyModel, ModelType, Perspective, ViewEntry, ViewPerspectiveKey, ViewRef, WeakViewRef},
};

/// Application logic bound to a route.
///
/// Loads for one handler never overlap: the handler sits behind an async mutex for the duration of its
/// load step.
pub trait Handler: Send + 'static {
    /// The model this handler produces.
    type Model: Clone + Send + Sync + 'static;

    /// Loads the model for a navigation and returns the perspective to display it in.
    ///
    /// A handler may redirect by navigating again through [`LoadContext::redirect`] (or directly on the
    /// dispatcher). A redirect suppresses the completion of the current navigation.
    fn load(
        &mut self,
        params: &Parameters,
        ctx: &LoadContext,
    ) -> impl Future<Output = Result<Perspective, BoxError>> + Send;

    /// The current model, if one has been loaded.
    fn model(&self) -> Option<Self::Model>;
}

/// An object safe handler, implemented for every [`Handler`].
pub(crate) trait DynHandler: Send {
    fn load_dyn<'a>(
        &'a mut self,
        params: &'a Parameters,
        ctx: &'a LoadContext,
    ) -> BoxFuture<'a, Result<Perspective, BoxError>>;

    fn model_dyn(&self) -> Option<AnyModel>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<H: Handler> DynHandler for H {
    fn load_dyn<'a>(
        &'a mut self,
        params: &'a Parameters,
        ctx: &'a LoadContext,
    ) -> BoxFuture<'a, Result<Perspective, BoxError>> {
        Handler::load(self, params, ctx).boxed()
    }

    fn model_dyn(&self) -> Option<AnyModel> {
        Handler::model(self).map(AnyModel::new)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct Lifecycle {
    view_entry: Option<ViewEntry>,
    view: Option<WeakViewRef>,
}

/// A shared handle to a handler instance and its lifecycle record.
///
/// Cloning is cheap and every clone refers to the same handler.
#[derive(Clone)]
pub struct HandlerRef {
    id: HandlerId,
    name: &'static str,
    model_type: ModelType,
    handler: Arc<tokio::sync::Mutex<Box<dyn DynHandler>>>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl HandlerRef {
    /// Wraps a handler instance.
    pub fn new<H: Handler>(handler: H) -> Self {
        let handler: Box<dyn DynHandler> = Box::new(handler);
        HandlerRef {
            id: HandlerId::generate(),
            name: any::type_name::<H>(),
            model_type: ModelType::of::<H::Model>(),
            handler: Arc::new(tokio::sync::Mutex::new(handler)),
            lifecycle: Arc::default(),
        }
    }

    /// The unique id of this handler.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The handler's type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type of model the handler produces, used to look up its views.
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// The view entry of the handler's last navigation.
    pub fn view_entry(&self) -> Option<ViewEntry> {
        self.lifecycle().view_entry.clone()
    }

    /// Moves the handler's views to a viewport. Later navigations keep this viewport.
    pub fn set_viewport(&self, viewport_id: impl Into<String>) {
        let mut lifecycle = self.lifecycle();
        let entry = lifecycle
            .view_entry
            .take()
            .unwrap_or_else(|| ViewEntry::new(self.default_key()));
        lifecycle.view_entry = Some(entry.in_viewport(viewport_id));
    }

    /// The view the handler was last presented in, if it is still alive.
    pub fn bound_view(&self) -> Option<ViewRef> {
        self.lifecycle().view.as_ref().and_then(WeakViewRef::upgrade)
    }

    /// Binds a view to the handler so later navigations push their models into it.
    pub fn bind_view(&self, view: &ViewRef) {
        self.lifecycle().view = Some(view.downgrade());
    }

    /// Removes the view binding.
    pub fn unbind_view(&self) {
        self.lifecycle().view = None;
    }

    /// The handler's current model, waiting for any running load to finish.
    pub async fn model(&self) -> Option<AnyModel> {
        self.handler.lock().await.model_dyn()
    }

    /// Runs `f` with mutable access to the handler if it is an `H`, waiting for any running load to finish.
    pub async fn with<H, R>(&self, f: impl FnOnce(&mut H) -> R) -> Option<R>
    where
        H: Handler,
    {
        let mut guard = self.handler.lock().await;
        guard.as_any_mut().downcast_mut::<H>().map(f)
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Box<dyn DynHandler>> {
        self.handler.lock().await
    }

    /// Gives a handler that has never navigated the default perspective in the default viewport.
    pub(crate) fn ensure_view_entry(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.view_entry.is_none() {
            lifecycle.view_entry = Some(ViewEntry::new(self.default_key()));
        }
    }

    /// Builds the entry for a completed load, keeping the viewport of the previous entry.
    pub(crate) fn next_view_entry(
        &self,
        key: ViewPerspectiveKey,
        uri: &str,
        params: Parameters,
    ) -> ViewEntry {
        let viewport_id = self
            .lifecycle()
            .view_entry
            .as_ref()
            .map(|entry| entry.viewport_id().to_string())
            .unwrap_or_default();
        ViewEntry::new(key)
            .in_viewport(viewport_id)
            .with_uri(uri)
            .with_parameters(params)
    }

    pub(crate) fn set_view_entry(&self, entry: ViewEntry) {
        self.lifecycle().view_entry = Some(entry);
    }

    fn default_key(&self) -> ViewPerspectiveKey {
        ViewPerspectiveKey::new(self.model_type, Perspective::DEFAULT)
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HandlerRef {}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Context passed to [`Handler::load`].
pub struct LoadContext {
    dispatcher: Dispatcher,
    handler: HandlerRef,
    from_view: Option<ViewRef>,
    uri: String,
    cancel: CancelFlag,
}

impl LoadContext {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        handler: HandlerRef,
        from_view: Option<ViewRef>,
        uri: String,
        cancel: CancelFlag,
    ) -> Self {
        LoadContext {
            dispatcher,
            handler,
            from_view,
            uri,
            cancel,
        }
    }

    /// The dispatcher running this load.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The handler being loaded.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// The view that started the navigation, if any.
    pub fn from_view(&self) -> Option<&ViewRef> {
        self.from_view.as_ref()
    }

    /// The url being navigated to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Starts a new navigation and suppresses completion of the current one.
    ///
    /// In threaded mode the redirect is scheduled and this returns immediately. Awaiting the returned
    /// [`Navigation`] from inside the load can deadlock when loads are serialized per dispatcher.
    pub async fn redirect(&self, url: &str, params: Parameters) -> Navigation {
        self.dispatcher.navigate(url, params).await
    }

    /// Suppresses completion of the current navigation without navigating elsewhere.
    pub fn cancel(&self) {
        self.cancel.set();
    }

    /// Returns `true` if completion of the current navigation has been suppressed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_set()
    }
}

impl fmt::Debug for LoadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadContext")
            .field("handler", &self.handler)
            .field("uri", &self.uri)
            .field("cancelled", &self.cancel.is_set())
            .finish()
    }
}
