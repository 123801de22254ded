//! Orchestrates navigation: route resolution, handler loads and hand-off to views.
//!
//! A [`Dispatcher`] owns a [`RouteTable`] and a [`ViewRegistry`]. Navigating to a url resolves the url to a
//! route, merges the navigation parameters, and schedules the route handler's load step. In threaded mode
//! (the default) the load runs on the tokio runtime and [`Dispatcher::navigate`] returns as soon as it is
//! scheduled; in synchronous mode the load runs inline on the navigating task.
//!
//! When a load finishes, the dispatcher maps the returned perspective to a view type, pushes the new model
//! into the view the handler was last presented in, and asks the [`Host`] to display the result. Failures
//! are never returned to the navigating caller; they are reported through [`Host::on_load_failed`].
//!
//! # Redirects
//!
//! A navigation started by the same dispatcher from inside a load is a redirect. It schedules a new
//! navigation and suppresses completion of the load that issued it. Cancellation is tracked by a flag whose
//! scope is set by [`CancelScope`]; the navigation a redirect starts always gets a flag of its own, so it
//! completes whatever the redirecting load does next. A redirect never interrupts a load that is already
//! running.

use std::{
    fmt,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use futures::{future::BoxFuture, FutureExt};
use tokio::{runtime::Handle, task_local};
use tracing::{debug, trace, warn};

use crate::{
    error::{NavigationError, PanicError, RouteError, ViewError},
    handler::{HandlerRef, LoadContext},
    id::{DispatcherId, HandlerId},
    route::{Parameters, RouteTable},
    view::{View, ViewPerspectiveKey, ViewRef, ViewRegistry},
};

mod config;
mod host;
mod navigation;

pub use config::{
    CancelScope, DispatcherConfig, LoadSerialization, DEFAULT_CANCEL_SCOPE,
    DEFAULT_LOAD_SERIALIZATION,
};
pub use host::{DispatchComplete, Host};
pub use navigation::{Navigation, NavigationOutcome};

pub(crate) use navigation::CancelFlag;

task_local! {
    static LOAD_CHAIN: LoadChain;
}

/// The loads running on the current task, outermost first.
#[derive(Clone, Default)]
struct LoadChain(Vec<LoadFrame>);

#[derive(Clone)]
struct LoadFrame {
    dispatcher: DispatcherId,
    handler: HandlerId,
    cancel: CancelFlag,
}

impl LoadChain {
    fn current() -> LoadChain {
        LOAD_CHAIN.try_with(LoadChain::clone).unwrap_or_default()
    }

    fn within(&self, dispatcher: DispatcherId) -> bool {
        self.0.iter().any(|frame| frame.dispatcher == dispatcher)
    }

    fn is_loading(&self, handler: HandlerId) -> bool {
        self.0.iter().any(|frame| frame.handler == handler)
    }

    fn innermost(&self, dispatcher: DispatcherId) -> Option<&LoadFrame> {
        self.0.iter().rev().find(|frame| frame.dispatcher == dispatcher)
    }

    fn push(mut self, frame: LoadFrame) -> LoadChain {
        self.0.push(frame);
        self
    }
}

struct DispatcherInner {
    id: DispatcherId,
    config: DispatcherConfig,
    routes: Arc<RwLock<RouteTable>>,
    views: Arc<Mutex<ViewRegistry>>,
    host: Arc<dyn Host>,
    runtime: Option<Handle>,
    cancel: CancelFlag,
    enqueue_lock: Mutex<()>,
    load_lock: Arc<tokio::sync::Mutex<()>>,
}

/// The navigation engine.
///
/// Cloning is cheap and every clone drives the same route table, view registry and host.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default configuration and the default `()` host.
    pub fn new() -> Self {
        Dispatcher::builder().build()
    }

    /// Creates a dispatcher with the given configuration and the default `()` host.
    pub fn with_config(config: DispatcherConfig) -> Self {
        Dispatcher::builder().config(config).build()
    }

    /// Returns a builder for a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Returns `true` if both handles drive the same dispatcher.
    pub fn ptr_eq(&self, other: &Dispatcher) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The dispatcher's configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// A shared handle to the route table.
    pub fn route_table(&self) -> Arc<RwLock<RouteTable>> {
        self.inner.routes.clone()
    }

    /// Locks the route table for reading.
    pub fn routes(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.inner.routes.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the route table for writing.
    pub fn routes_mut(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.inner.routes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the view registry.
    pub fn views(&self) -> MutexGuard<'_, ViewRegistry> {
        self.inner.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a route. See [`RouteTable::register`].
    pub fn register_route(
        &self,
        pattern: &str,
        handler: HandlerRef,
        defaults: Parameters,
    ) -> Result<bool, RouteError> {
        self.routes_mut().register(pattern, handler, defaults)
    }

    /// Maps a perspective to a default constructed view type. See [`ViewRegistry::register`].
    pub fn register_view<V>(&self, key: ViewPerspectiveKey) -> Result<(), ViewError>
    where
        V: View + Default,
    {
        self.views().register::<V>(key)
    }

    /// Maps a perspective to views built by a factory. See [`ViewRegistry::register_factory`].
    pub fn register_view_factory<V, F>(
        &self,
        key: ViewPerspectiveKey,
        factory: F,
    ) -> Result<(), ViewError>
    where
        V: View,
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.views().register_factory(key, factory)
    }

    /// Resolves a url to its handler and the merged navigation parameters, without navigating.
    ///
    /// Useful for hosts deciding whether a url is handled here or should be opened externally.
    pub fn resolve(&self, url: &str, params: Parameters) -> Option<(HandlerRef, Parameters)> {
        let routes = self.routes();
        let found = routes.resolve(url)?;
        let handler = found.handler().clone();
        Some((handler, found.into_parameters(params)))
    }

    /// Navigates to a url.
    ///
    /// Urls that match no route are logged and ignored; opening external urls is up to the host.
    pub async fn navigate(&self, url: &str, params: Parameters) -> Navigation {
        self.start(None, url.to_string(), params).await
    }

    /// Navigates to a url on behalf of a view.
    pub async fn navigate_from(
        &self,
        from_view: Option<ViewRef>,
        url: &str,
        params: Parameters,
    ) -> Navigation {
        self.start(from_view, url.to_string(), params).await
    }

    /// Loads a handler that is not bound to a route, as if `uri` had resolved to it with `params`.
    pub async fn dispatch(
        &self,
        from_view: Option<ViewRef>,
        handler: HandlerRef,
        uri: &str,
        params: Parameters,
    ) -> Navigation {
        let redirecting = LoadChain::current().innermost(self.inner.id).cloned();
        let navigation = self
            .schedule(from_view, handler, uri.to_string(), params, redirecting.is_some())
            .await;
        self.cancel_redirecting(redirecting, navigation.url());
        navigation
    }

    /// Displays a completed navigation.
    ///
    /// Gets or creates the view for the completion's entry, pushes the model into it, renders it and binds
    /// it to the handler, so later loads of the handler refresh it. This is what the default
    /// [`Host::on_dispatch_complete`] does.
    pub fn present(&self, completion: &DispatchComplete) -> Result<ViewRef, ViewError> {
        let view = self.views().get_or_create(completion.entry())?;
        if let Some(model) = completion.model() {
            view.set_model(model)?;
        }
        view.render();
        completion.handler().bind_view(&view);
        trace!(
            key = %completion.key(),
            viewport = completion.entry().viewport_id(),
            view = %view.id(),
            "presented view"
        );
        Ok(view)
    }

    fn start(
        &self,
        from_view: Option<ViewRef>,
        url: String,
        mut params: Parameters,
    ) -> BoxFuture<'static, Navigation> {
        let this = self.clone();
        async move {
            let redirecting = LoadChain::current().innermost(this.inner.id).cloned();
            let navigation = match this.resolve_into(&url, &mut params) {
                Some(handler) => {
                    this.schedule(from_view, handler, url, params, redirecting.is_some())
                        .await
                }
                None => {
                    debug!(%url, "no route matches url, ignoring navigation");
                    Navigation::finished(url, NavigationOutcome::NotFound)
                }
            };
            this.cancel_redirecting(redirecting, navigation.url());
            navigation
        }
        .boxed()
    }

    fn resolve_into(&self, url: &str, params: &mut Parameters) -> Option<HandlerRef> {
        let routes = self.routes();
        let found = routes.resolve(url)?;
        found.merge_into(params);
        Some(found.handler().clone())
    }

    fn cancel_redirecting(&self, redirecting: Option<LoadFrame>, url: &str) {
        if let Some(frame) = redirecting {
            debug!(%url, handler = %frame.handler, "redirect suppresses completion of the current load");
            frame.cancel.set();
        }
    }

    fn schedule(
        &self,
        from_view: Option<ViewRef>,
        handler: HandlerRef,
        url: String,
        params: Parameters,
        redirect: bool,
    ) -> BoxFuture<'static, Navigation> {
        let this = self.clone();
        async move {
            handler.ensure_view_entry();
            this.inner.host.on_load_begin(&handler, from_view.as_ref());

            // A redirect never shares the flag of the load it cancels.
            let cancel = match this.inner.config.cancel_scope {
                CancelScope::Dispatcher if !redirect => {
                    this.inner.cancel.reset();
                    this.inner.cancel.clone()
                }
                _ => CancelFlag::default(),
            };

            let task = this
                .clone()
                .run_load(from_view, handler, url.clone(), params, cancel);
            if this.inner.config.threaded {
                match this.runtime() {
                    Some(runtime) => {
                        let handle = {
                            let _guard = this
                                .inner
                                .enqueue_lock
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner);
                            runtime.spawn(task)
                        };
                        trace!(%url, "scheduled load");
                        return Navigation::scheduled(url, handle);
                    }
                    None => warn!(%url, "no tokio runtime available, loading inline"),
                }
            }

            let outcome = task.await;
            Navigation::finished(url, outcome)
        }
        .boxed()
    }

    fn runtime(&self) -> Option<Handle> {
        self.inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
    }

    fn run_load(
        self,
        from_view: Option<ViewRef>,
        handler: HandlerRef,
        url: String,
        params: Parameters,
        cancel: CancelFlag,
    ) -> BoxFuture<'static, NavigationOutcome> {
        async move {
            let chain = LoadChain::current();
            let _serialized = match self.inner.config.load_serialization {
                LoadSerialization::PerDispatcher if !chain.within(self.inner.id) => {
                    Some(self.inner.load_lock.clone().lock_owned().await)
                }
                _ => None,
            };

            let result = if chain.is_loading(handler.id()) {
                Err(NavigationError::ReentrantLoad {
                    handler: handler.name(),
                })
            } else {
                let frame = LoadFrame {
                    dispatcher: self.inner.id,
                    handler: handler.id(),
                    cancel: cancel.clone(),
                };
                let load = AssertUnwindSafe(self.load_and_complete(
                    from_view,
                    &handler,
                    &url,
                    params,
                    &cancel,
                ))
                .catch_unwind();
                match LOAD_CHAIN.scope(chain.push(frame), load).await {
                    Ok(result) => result,
                    Err(payload) => Err(NavigationError::LoadPanicked {
                        handler: handler.name(),
                        panic: PanicError::new_from_panic_any(payload),
                    }),
                }
            };
            cancel.reset();

            match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    debug!(%url, handler = handler.name(), %err, "load failed");
                    self.inner.host.on_load_failed(&handler, &err);
                    NavigationOutcome::Failed(err)
                }
            }
        }
        .boxed()
    }

    async fn load_and_complete(
        &self,
        from_view: Option<ViewRef>,
        handler: &HandlerRef,
        url: &str,
        params: Parameters,
        cancel: &CancelFlag,
    ) -> Result<NavigationOutcome, NavigationError> {
        let ctx = LoadContext::new(
            self.clone(),
            handler.clone(),
            from_view.clone(),
            url.to_string(),
            cancel.clone(),
        );
        let (perspective, model) = {
            let mut guard = handler.lock().await;
            trace!(%url, handler = handler.name(), "loading");
            let perspective = guard
                .load_dyn(&params, &ctx)
                .await
                .map_err(|source| NavigationError::LoadFailed {
                    handler: handler.name(),
                    source,
                })?;
            (perspective, guard.model_dyn())
        };

        if cancel.is_set() {
            debug!(%url, handler = handler.name(), "load cancelled, skipping completion");
            return Ok(NavigationOutcome::Redirected);
        }

        let key = ViewPerspectiveKey::new(handler.model_type(), perspective);
        let entry = handler.next_view_entry(key.clone(), url, params);
        if !self.views().contains_key(&key) {
            return Err(ViewError::UnmappedPerspective { key }.into());
        }
        handler.set_view_entry(entry.clone());

        if let (Some(view), Some(model)) = (handler.bound_view(), model.as_ref()) {
            if let Err(err) = view.set_model(model) {
                warn!(view = %view.id(), %err, "failed to refresh bound view");
            }
        }

        debug!(%url, handler = handler.name(), %key, "dispatch complete");
        self.inner.host.on_dispatch_complete(
            self,
            DispatchComplete {
                from_view,
                handler: handler.clone(),
                key: key.clone(),
                entry,
                model,
            },
        );
        Ok(NavigationOutcome::Completed(key))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("routes", &self.routes().len())
            .finish()
    }
}

/// Builds a [`Dispatcher`].
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    host: Arc<dyn Host>,
    runtime: Option<Handle>,
    views: ViewRegistry,
}

impl DispatcherBuilder {
    fn new() -> Self {
        DispatcherBuilder {
            config: DispatcherConfig::default(),
            host: Arc::new(()),
            runtime: None,
            views: ViewRegistry::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs loads on the tokio runtime (`true`) or inline (`false`).
    pub fn threaded(mut self, threaded: bool) -> Self {
        self.config.threaded = threaded;
        self
    }

    /// Rejects (`true`) or ignores (`false`) duplicate route registrations.
    pub fn strict_routes(mut self, strict: bool) -> Self {
        self.config.strict_routes = strict;
        self
    }

    /// Sets the load serialization policy.
    pub fn load_serialization(mut self, policy: LoadSerialization) -> Self {
        self.config.load_serialization = policy;
        self
    }

    /// Sets the cancel scope.
    pub fn cancel_scope(mut self, scope: CancelScope) -> Self {
        self.config.cancel_scope = scope;
        self
    }

    /// Sets the host receiving navigation hooks.
    pub fn host(self, host: impl Host) -> Self {
        self.shared_host(Arc::new(host))
    }

    /// Sets a host shared with other owners.
    pub fn shared_host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = host;
        self
    }

    /// Runs threaded loads on this runtime instead of the runtime current at navigation time.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Starts from a populated view registry.
    pub fn views(mut self, views: ViewRegistry) -> Self {
        self.views = views;
        self
    }

    /// Builds the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                id: DispatcherId::generate(),
                routes: Arc::new(RwLock::new(RouteTable::new(self.config.strict_routes))),
                config: self.config,
                views: Arc::new(Mutex::new(self.views)),
                host: self.host,
                runtime: self.runtime,
                cancel: CancelFlag::default(),
                enqueue_lock: Mutex::new(()),
                load_lock: Arc::new(tokio::sync::Mutex::new(())),
            }),
        }
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::BoxError,
        handler::Handler,
        view::{Perspective, View},
    };

    #[derive(Clone, Debug, PartialEq)]
    struct Customer {
        id: String,
    }

    #[derive(Default)]
    struct Customers {
        current: Option<Customer>,
    }

    impl Handler for Customers {
        type Model = Customer;

        async fn load(
            &mut self,
            params: &Parameters,
            _ctx: &LoadContext,
        ) -> Result<Perspective, BoxError> {
            let id = params.get("id").cloned().unwrap_or_default();
            if id == "missing" {
                return Err("customer not found".into());
            }
            self.current = Some(Customer { id });
            Ok(Perspective::READ)
        }

        fn model(&self) -> Option<Self::Model> {
            self.current.clone()
        }
    }

    #[derive(Default)]
    struct CustomerView {
        shown: Option<Customer>,
        renders: u32,
    }

    impl View for CustomerView {
        type Model = Customer;

        fn set_model(&mut self, model: Self::Model) {
            self.shown = Some(model);
        }

        fn render(&mut self) {
            self.renders += 1;
        }
    }

    /// Redirects to the url in its `to` parameter.
    struct Redirect;

    impl Handler for Redirect {
        type Model = ();

        async fn load(
            &mut self,
            params: &Parameters,
            ctx: &LoadContext,
        ) -> Result<Perspective, BoxError> {
            let to = params.get("to").cloned().unwrap_or_default();
            let _ = ctx.redirect(&to, Parameters::new()).await;
            Ok(Perspective::DEFAULT)
        }

        fn model(&self) -> Option<Self::Model> {
            None
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Begin(HandlerId),
        Failed(HandlerId),
        Complete(ViewPerspectiveKey),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl Host for Recorder {
        fn on_load_begin(&self, handler: &HandlerRef, _from_view: Option<&ViewRef>) {
            self.events.lock().unwrap().push(Event::Begin(handler.id()));
        }

        fn on_load_failed(&self, handler: &HandlerRef, _error: &NavigationError) {
            self.events.lock().unwrap().push(Event::Failed(handler.id()));
        }

        fn on_dispatch_complete(&self, dispatcher: &Dispatcher, completion: DispatchComplete) {
            dispatcher.present(&completion).unwrap();
            self.events
                .lock()
                .unwrap()
                .push(Event::Complete(completion.key().clone()));
        }
    }

    fn params<const N: usize>(pairs: [(&str, &str); N]) -> Parameters {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn read_key() -> ViewPerspectiveKey {
        ViewPerspectiveKey::of::<Customer>(Perspective::READ)
    }

    fn setup(config: DispatcherConfig) -> (Dispatcher, HandlerRef, Arc<Recorder>) {
        let host = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::builder()
            .config(config)
            .shared_host(host.clone())
            .build();
        let customers = HandlerRef::new(Customers::default());
        dispatcher
            .register_route("Customers/{id}", customers.clone(), Parameters::new())
            .unwrap();
        dispatcher
            .register_route(
                "Legacy",
                HandlerRef::new(Redirect),
                params([("to", "Customers/7")]),
            )
            .unwrap();
        dispatcher
            .register_route("Loop", HandlerRef::new(Redirect), params([("to", "Loop")]))
            .unwrap();
        dispatcher.register_view::<CustomerView>(read_key()).unwrap();
        (dispatcher, customers, host)
    }

    #[tokio::test]
    async fn synchronous_navigation_presents_the_view() {
        let (dispatcher, customers, host) = setup(DispatcherConfig::synchronous());

        let navigation = dispatcher.navigate("Customers/42", Parameters::new()).await;
        assert!(!navigation.is_scheduled());
        assert!(navigation.is_finished());
        assert_eq!(navigation.wait().await.key(), Some(&read_key()));
        assert_eq!(
            host.take(),
            vec![Event::Begin(customers.id()), Event::Complete(read_key())]
        );

        let entry = customers.view_entry().unwrap();
        assert_eq!(entry.uri(), "Customers/42");
        assert_eq!(entry.parameters().get("id").unwrap(), "42");

        let view = customers.bound_view().unwrap();
        assert_eq!(dispatcher.views().get(&read_key()), Some(view.clone()));
        let shown = view.with(|v: &mut CustomerView| (v.shown.clone(), v.renders));
        assert_eq!(
            shown,
            Some((
                Some(Customer {
                    id: "42".to_string()
                }),
                1
            ))
        );
    }

    #[tokio::test]
    async fn unmatched_urls_are_ignored() {
        let (dispatcher, _, host) = setup(DispatcherConfig::synchronous());

        let outcome = dispatcher
            .navigate("https://example.com", Parameters::new())
            .await
            .wait()
            .await;
        assert!(matches!(outcome, NavigationOutcome::NotFound));
        assert!(host.take().is_empty());
        assert!(dispatcher.resolve("Customers", Parameters::new()).is_none());
    }

    #[tokio::test]
    async fn load_errors_reach_the_host() {
        let (dispatcher, customers, host) = setup(DispatcherConfig::synchronous());

        let outcome = dispatcher
            .navigate("Customers/missing", Parameters::new())
            .await
            .wait()
            .await;
        assert!(matches!(
            outcome.error(),
            Some(NavigationError::LoadFailed { .. })
        ));
        assert_eq!(
            host.take(),
            vec![Event::Begin(customers.id()), Event::Failed(customers.id())]
        );
        assert!(!dispatcher.inner.cancel.is_set());
    }

    #[tokio::test]
    async fn redirect_suppresses_the_redirecting_load() {
        let (dispatcher, customers, host) = setup(DispatcherConfig::synchronous());
        let (legacy, _) = dispatcher.resolve("Legacy", Parameters::new()).unwrap();

        let outcome = dispatcher
            .navigate("Legacy", Parameters::new())
            .await
            .wait()
            .await;
        assert!(matches!(outcome, NavigationOutcome::Redirected));
        assert_eq!(
            host.take(),
            vec![
                Event::Begin(legacy.id()),
                Event::Begin(customers.id()),
                Event::Complete(read_key()),
            ]
        );
        assert_eq!(customers.view_entry().unwrap().uri(), "Customers/7");
        assert!(!dispatcher.inner.cancel.is_set());
    }

    #[tokio::test]
    async fn redirect_back_to_a_loading_handler_fails() {
        let (dispatcher, _, host) = setup(DispatcherConfig::synchronous());
        let (looping, _) = dispatcher.resolve("Loop", Parameters::new()).unwrap();

        let outcome = dispatcher
            .navigate("Loop", Parameters::new())
            .await
            .wait()
            .await;
        assert!(matches!(outcome, NavigationOutcome::Redirected));
        assert_eq!(
            host.take(),
            vec![
                Event::Begin(looping.id()),
                Event::Begin(looping.id()),
                Event::Failed(looping.id()),
            ]
        );
    }

    #[tokio::test]
    async fn dispatch_loads_handlers_without_a_route() {
        let (dispatcher, _, host) = setup(DispatcherConfig::synchronous());
        let detached = HandlerRef::new(Customers::default());

        let outcome = dispatcher
            .dispatch(None, detached.clone(), "Customers/9", params([("id", "9")]))
            .await
            .wait()
            .await;
        assert!(outcome.is_completed());
        assert_eq!(
            host.take(),
            vec![Event::Begin(detached.id()), Event::Complete(read_key())]
        );
        assert_eq!(detached.view_entry().unwrap().uri(), "Customers/9");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn threaded_navigation_runs_on_the_runtime() {
        let (dispatcher, customers, host) = setup(DispatcherConfig::default());

        let navigation = dispatcher.navigate("Customers/1", Parameters::new()).await;
        assert!(navigation.is_scheduled());
        assert!(navigation.wait().await.is_completed());
        assert_eq!(
            host.take(),
            vec![Event::Begin(customers.id()), Event::Complete(read_key())]
        );
    }

    #[test]
    fn synchronous_navigation_finishes_before_returning() {
        let (dispatcher, customers, host) = setup(DispatcherConfig::synchronous());

        let navigation = tokio_test::block_on(dispatcher.navigate("Customers/5", Parameters::new()));
        assert!(navigation.is_finished());
        assert_eq!(
            host.take(),
            vec![Event::Begin(customers.id()), Event::Complete(read_key())]
        );
        assert_eq!(customers.view_entry().unwrap().uri(), "Customers/5");
    }

    // Polled outside any tokio runtime, so there is nothing to spawn on.
    #[test]
    fn threaded_navigation_without_a_runtime_runs_inline() {
        let (dispatcher, _, host) = setup(DispatcherConfig::default());

        let navigation =
            futures::executor::block_on(dispatcher.navigate("Customers/1", Parameters::new()));
        assert!(!navigation.is_scheduled());
        assert_eq!(host.take().len(), 2);
    }
}
