use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::task::JoinHandle;
use tracing::warn;

use crate::{error::NavigationError, view::ViewPerspectiveKey};

/// How a navigation ended.
#[derive(Debug)]
pub enum NavigationOutcome {
    /// No route matched the url. Nothing was loaded.
    NotFound,
    /// The load finished and the host was asked to display the perspective.
    Completed(ViewPerspectiveKey),
    /// The load finished but its completion was suppressed by a redirect or cancellation.
    Redirected,
    /// The navigation failed. The host's `on_load_failed` hook has already been called.
    Failed(NavigationError),
    /// The worker task running the load was dropped before it finished, e.g. on runtime shutdown.
    Aborted,
}

impl NavigationOutcome {
    /// Returns `true` for [`NavigationOutcome::Completed`].
    pub fn is_completed(&self) -> bool {
        matches!(self, NavigationOutcome::Completed(_))
    }

    /// The displayed perspective of a completed navigation.
    pub fn key(&self) -> Option<&ViewPerspectiveKey> {
        match self {
            NavigationOutcome::Completed(key) => Some(key),
            _ => None,
        }
    }

    /// The error of a failed navigation.
    pub fn error(&self) -> Option<&NavigationError> {
        match self {
            NavigationOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

enum State {
    Finished(NavigationOutcome),
    Scheduled(JoinHandle<NavigationOutcome>),
}

/// A handle to a started navigation.
///
/// Navigation is fire and forget: dropping the handle lets a scheduled load run to completion in the
/// background. [`Navigation::wait`] can be used to observe how it ended.
pub struct Navigation {
    url: String,
    state: State,
}

impl Navigation {
    pub(crate) fn finished(url: String, outcome: NavigationOutcome) -> Self {
        Navigation {
            url,
            state: State::Finished(outcome),
        }
    }

    pub(crate) fn scheduled(url: String, handle: JoinHandle<NavigationOutcome>) -> Self {
        Navigation {
            url,
            state: State::Scheduled(handle),
        }
    }

    /// The url that was navigated to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` if the load ran on a worker rather than inline.
    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, State::Scheduled(_))
    }

    /// Returns `true` once the navigation has ended.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            State::Finished(_) => true,
            State::Scheduled(handle) => handle.is_finished(),
        }
    }

    /// Waits for the navigation to end.
    pub async fn wait(self) -> NavigationOutcome {
        match self.state {
            State::Finished(outcome) => outcome,
            State::Scheduled(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(url = %self.url, %err, "navigation task did not finish");
                    NavigationOutcome::Aborted
                }
            },
        }
    }
}

impl fmt::Debug for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Finished(outcome) => format!("{outcome:?}"),
            State::Scheduled(handle) if handle.is_finished() => "Finished".to_string(),
            State::Scheduled(_) => "Running".to_string(),
        };
        f.debug_struct("Navigation")
            .field("url", &self.url)
            .field("state", &state)
            .finish()
    }
}

/// A flag suppressing the completion of a load.
#[derive(Clone, Debug, Default)]
pub(crate) struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub(crate) fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
