//! Per-session navigation engines.
//!
//! Multi-user hosts keep one [`Dispatcher`] per session. A [`SessionStore`] maps session ids to [`Session`]
//! records, resolving the current session id through a pluggable resolver. Without a resolver every caller
//! shares the [`DEFAULT_SESSION_ID`] session, which suits single-user hosts.
//!
//! Each session record holds the session's dispatcher and route table under reserved keys, next to
//! arbitrary values the application stores for the session. Clearing or abandoning a session removes those
//! values but never the reserved entries, so the active navigation engine survives.
//!
//! ```
//! use waypoint::session::SessionStore;
//!
//! let store = SessionStore::new();
//! store.insert("basket", vec![1, 2, 3]);
//! let dispatcher = store.current();
//!
//! store.abandon();
//! assert_eq!(store.get::<Vec<i32>>("basket"), None);
//! assert!(store.current().ptr_eq(&dispatcher));
//! ```

use std::{
    any::Any,
    borrow::Borrow,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{dispatcher::Dispatcher, route::RouteTable};

/// The session id used when no resolver is configured.
pub const DEFAULT_SESSION_ID: &str = "default";

/// The reserved key holding a session's [`Dispatcher`].
pub const DISPATCHER_KEY: &str = "waypoint.dispatcher";

/// The reserved key holding a session's route table.
pub const ROUTES_KEY: &str = "waypoint.routes";

static GLOBAL_SESSIONS: Lazy<SessionStore> = Lazy::new(SessionStore::new);

type SessionResolver = Arc<dyn Fn() -> SessionId + Send + Sync>;
type DispatcherFactory = Arc<dyn Fn(&SessionId) -> Dispatcher + Send + Sync>;

/// Identifies a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session id.
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        SessionId::new(DEFAULT_SESSION_ID)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        SessionId(id)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The state of one session.
pub struct Session {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
    dispatcher: Dispatcher,
}

impl Session {
    fn new(dispatcher: Dispatcher) -> Self {
        let mut values: HashMap<String, Box<dyn Any + Send + Sync>> = HashMap::new();
        values.insert(ROUTES_KEY.to_string(), Box::new(dispatcher.route_table()));
        values.insert(DISPATCHER_KEY.to_string(), Box::new(dispatcher.clone()));
        Session { values, dispatcher }
    }

    /// Returns `true` for the keys holding the session's dispatcher and route table.
    pub fn is_reserved(key: &str) -> bool {
        key == DISPATCHER_KEY || key == ROUTES_KEY
    }

    /// The session's dispatcher.
    pub fn dispatcher(&self) -> Dispatcher {
        debug_assert!(self
            .get::<Dispatcher>(DISPATCHER_KEY)
            .is_some_and(|stored| stored.ptr_eq(&self.dispatcher)));
        self.dispatcher.clone()
    }

    /// The session's route table.
    pub fn route_table(&self) -> Option<Arc<RwLock<RouteTable>>> {
        self.get(ROUTES_KEY)
    }

    /// Returns a clone of the value stored under `key`, if it has type `T`.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.values.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Stores a value, returning `false` if the key is reserved.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T) -> bool
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        if Session::is_reserved(&key) {
            warn!(%key, "refusing to overwrite a reserved session key");
            return false;
        }
        self.values.insert(key, Box::new(value));
        true
    }

    /// Removes a value, returning `true` if one was removed. Reserved keys are never removed.
    pub fn remove(&mut self, key: &str) -> bool {
        !Session::is_reserved(key) && self.values.remove(key).is_some()
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The stored keys, reserved keys included.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored values, reserved keys included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if only the reserved keys are stored.
    pub fn is_empty(&self) -> bool {
        self.values.keys().all(|key| Session::is_reserved(key))
    }

    /// Removes every value except the reserved entries.
    pub fn clear(&mut self) {
        self.values.retain(|key, _| Session::is_reserved(key));
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A map from session ids to sessions.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    resolver: Option<SessionResolver>,
    factory: DispatcherFactory,
}

impl SessionStore {
    /// Creates a store sharing one default session, with dispatchers built by [`Dispatcher::new`].
    pub fn new() -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            resolver: None,
            factory: Arc::new(|_| Dispatcher::new()),
        }
    }

    /// The process-wide store.
    pub fn global() -> &'static SessionStore {
        &GLOBAL_SESSIONS
    }

    /// Resolves the current session id with `resolver`.
    pub fn with_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn() -> SessionId + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Builds the dispatcher of new sessions with `factory`.
    ///
    /// The factory runs without the store locked, and usually registers the application's routes and views.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&SessionId) -> Dispatcher + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// The current session id.
    pub fn session_id(&self) -> SessionId {
        match &self.resolver {
            Some(resolver) => resolver(),
            None => SessionId::default(),
        }
    }

    /// The dispatcher of the current session, creating the session if needed.
    pub fn current(&self) -> Dispatcher {
        self.dispatcher(&self.session_id())
    }

    /// The dispatcher of a session, creating the session if needed.
    pub fn dispatcher(&self, id: &SessionId) -> Dispatcher {
        self.with_session_id(id, |session| session.dispatcher())
    }

    /// Runs `f` on the current session, creating the session if needed.
    ///
    /// `f` runs with the store locked, so it must not call back into this store.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        self.with_session_id(&self.session_id(), f)
    }

    /// Runs `f` on a session, creating the session if needed.
    ///
    /// `f` runs with the store locked, so it must not call back into this store. Clone what you need out
    /// of the session and use the store after `f` returns. The dispatcher factory runs before the lock is
    /// taken.
    pub fn with_session_id<R>(&self, id: &SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        {
            let mut sessions = self.sessions();
            if let Some(session) = sessions.get_mut(id) {
                return f(session);
            }
        }

        let dispatcher = (self.factory)(id);
        let mut sessions = self.sessions();
        let session = sessions.entry(id.clone()).or_insert_with(|| {
            debug!(session = %id, "started session");
            Session::new(dispatcher)
        });
        f(session)
    }

    /// Stores a value in the current session, returning `false` if the key is reserved.
    pub fn insert<T>(&self, key: impl Into<String>, value: T) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.with_session(|session| session.insert(key, value))
    }

    /// Returns a clone of a value stored in the current session.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.with_session(|session| session.get(key))
    }

    /// Removes a value from the current session.
    pub fn remove(&self, key: &str) -> bool {
        self.with_session(|session| session.remove(key))
    }

    /// Removes every value of the current session except its dispatcher and route table.
    pub fn clear(&self) {
        self.with_session(Session::clear);
    }

    /// Abandons the current session. See [`SessionStore::abandon_session`].
    pub fn abandon(&self) {
        self.abandon_session(&self.session_id());
    }

    /// Abandons a session: its values are removed, its dispatcher and route table are kept.
    ///
    /// Returns `false` if the session does not exist.
    pub fn abandon_session(&self, id: &SessionId) -> bool {
        match self.sessions().get_mut(id) {
            Some(session) => {
                session.clear();
                debug!(session = %id, "abandoned session");
                true
            }
            None => false,
        }
    }

    /// Drops a session record entirely, dispatcher included.
    pub fn end_session(&self, id: &SessionId) -> Option<Session> {
        let session = self.sessions().remove(id);
        if session.is_some() {
            debug!(session = %id, "ended session");
        }
        session
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// The ids of all sessions, sorted.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::new()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.session_ids())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}
