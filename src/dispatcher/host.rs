use tracing::error;

use crate::{
    error::NavigationError,
    handler::HandlerRef,
    view::{AnyModel, ViewEntry, ViewPerspectiveKey, ViewRef},
};

use super::Dispatcher;

/// Hooks through which the embedding application takes part in navigation.
///
/// Every method has a default. The defaults log failures and present completed navigations with
/// [`Dispatcher::present`], so `()` is a usable host for applications that only need views rendered.
/// Hooks run on whichever task executes the load: a tokio worker in threaded mode.
pub trait Host: Send + Sync + 'static {
    /// Called before a handler's load is scheduled.
    fn on_load_begin(&self, handler: &HandlerRef, from_view: Option<&ViewRef>) {
        let _ = (handler, from_view);
    }

    /// Called once when a navigation fails after its load was scheduled.
    fn on_load_failed(&self, handler: &HandlerRef, error: &NavigationError) {
        error!(handler = handler.name(), %error, "navigation failed");
    }

    /// Called when a load completed without being cancelled and its perspective is mapped to a view.
    fn on_dispatch_complete(&self, dispatcher: &Dispatcher, completion: DispatchComplete) {
        if let Err(err) = dispatcher.present(&completion) {
            error!(handler = completion.handler().name(), key = %completion.key(), %err, "failed to present view");
        }
    }
}

impl Host for () {}

/// A completed navigation, handed to [`Host::on_dispatch_complete`].
#[derive(Clone, Debug)]
pub struct DispatchComplete {
    pub(crate) from_view: Option<ViewRef>,
    pub(crate) handler: HandlerRef,
    pub(crate) key: ViewPerspectiveKey,
    pub(crate) entry: ViewEntry,
    pub(crate) model: Option<AnyModel>,
}

impl DispatchComplete {
    /// The view that started the navigation, if any.
    pub fn from_view(&self) -> Option<&ViewRef> {
        self.from_view.as_ref()
    }

    /// The handler that was loaded.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// The perspective to display.
    pub fn key(&self) -> &ViewPerspectiveKey {
        &self.key
    }

    /// Where and with what navigation context to display it.
    pub fn entry(&self) -> &ViewEntry {
        &self.entry
    }

    /// The handler's model after the load.
    pub fn model(&self) -> Option<&AnyModel> {
        self.model.as_ref()
    }
}
