//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use waypoint::dispatcher::DispatchComplete;
use waypoint::error::{BoxError, NavigationError};
use waypoint::{
    Dispatcher, DispatcherConfig, Handler, HandlerId, HandlerRef, Host, LoadContext, Navigation,
    Parameters, Perspective, View, ViewPerspectiveKey, ViewRef,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub id: String,
}

impl Customer {
    pub fn new(id: &str) -> Self {
        Customer { id: id.to_string() }
    }
}

/// Loads the customer named by the `id` parameter.
///
/// The perspective comes from the `perspective` parameter, `GET` when absent.
#[derive(Default)]
pub struct Customers {
    pub current: Option<Customer>,
    pub loads: u32,
}

impl Handler for Customers {
    type Model = Customer;

    async fn load(&mut self, params: &Parameters, _ctx: &LoadContext) -> Result<Perspective, BoxError> {
        self.loads += 1;
        let id = params.get("id").ok_or("missing customer id")?;
        if id == "panic" {
            panic!("customer store unavailable");
        }
        self.current = Some(Customer::new(id));
        Ok(params
            .get("perspective")
            .map(|p| Perspective::new(p.clone()))
            .unwrap_or(Perspective::READ))
    }

    fn model(&self) -> Option<Self::Model> {
        self.current.clone()
    }
}

#[derive(Default)]
pub struct CustomerDetail {
    pub customer: Option<Customer>,
    pub renders: u32,
}

impl View for CustomerDetail {
    type Model = Customer;

    fn set_model(&mut self, model: Self::Model) {
        self.customer = Some(model);
    }

    fn render(&mut self) {
        self.renders += 1;
    }
}

pub fn shown(view: &ViewRef) -> Option<Customer> {
    view.with(|detail: &mut CustomerDetail| detail.customer.clone())
        .flatten()
}

/// Redirects to the url in its `to` parameter and keeps the redirect's navigation handle.
#[derive(Default)]
pub struct Redirect {
    pub redirected: Arc<Mutex<Option<Navigation>>>,
}

impl Handler for Redirect {
    type Model = ();

    async fn load(&mut self, params: &Parameters, ctx: &LoadContext) -> Result<Perspective, BoxError> {
        let to = params.get("to").ok_or("missing redirect target")?;
        let navigation = ctx.redirect(to, Parameters::new()).await;
        *self.redirected.lock().unwrap() = Some(navigation);
        Ok(Perspective::DEFAULT)
    }

    fn model(&self) -> Option<Self::Model> {
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Begin(HandlerId),
    Failed(HandlerId, String),
    Complete(HandlerId, ViewPerspectiveKey),
}

/// Records hook calls and presents completed navigations while `presenting` is set.
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    pub presenting: AtomicBool,
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder {
            events: Mutex::new(Vec::new()),
            presenting: AtomicBool::new(true),
        }
    }
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn completions(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Complete(..)))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Failed(..)))
            .count()
    }
}

impl Host for Recorder {
    fn on_load_begin(&self, handler: &HandlerRef, _from_view: Option<&ViewRef>) {
        self.events.lock().unwrap().push(Event::Begin(handler.id()));
    }

    fn on_load_failed(&self, handler: &HandlerRef, error: &NavigationError) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Failed(handler.id(), error.to_string()));
    }

    fn on_dispatch_complete(&self, dispatcher: &Dispatcher, completion: DispatchComplete) {
        if self.presenting.load(Ordering::SeqCst) {
            dispatcher.present(&completion).unwrap();
        }
        self.events.lock().unwrap().push(Event::Complete(
            completion.handler().id(),
            completion.key().clone(),
        ));
    }
}

pub fn params<const N: usize>(pairs: [(&str, &str); N]) -> Parameters {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn customer_key(perspective: Perspective) -> ViewPerspectiveKey {
    ViewPerspectiveKey::of::<Customer>(perspective)
}

pub struct App {
    pub dispatcher: Dispatcher,
    pub host: Arc<Recorder>,
    pub customers: HandlerRef,
}

/// A dispatcher with `Customer/{id}` routed to [`Customers`] and [`CustomerDetail`] mapped to `GET`.
pub fn app(config: DispatcherConfig) -> App {
    let host = Arc::new(Recorder::default());
    let dispatcher = Dispatcher::builder()
        .config(config)
        .shared_host(host.clone())
        .build();
    let customers = HandlerRef::new(Customers::default());
    dispatcher
        .register_route("Customer/{id}", customers.clone(), Parameters::new())
        .unwrap();
    dispatcher
        .register_view::<CustomerDetail>(customer_key(Perspective::READ))
        .unwrap();
    App {
        dispatcher,
        host,
        customers,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
