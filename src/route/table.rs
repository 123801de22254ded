//! The ordered table of routes a dispatcher resolves urls against.

use std::{fmt, slice};

use tracing::{debug, warn};

use crate::{
    error::{NavigationError, RouteError},
    handler::HandlerRef,
};

use super::{Parameters, Route, RouteMatch};

/// An ordered collection of routes.
///
/// Resolution walks the routes in registration order and returns the first whose pattern matches the
/// whole url. There is no ranking by specificity: order is the only tie-break.
///
/// The table is populated at startup and read afterwards. It is not synchronized on its own; the
/// [`Dispatcher`](crate::dispatcher::Dispatcher) keeps it behind a lock.
#[derive(Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    strict: bool,
}

impl RouteTable {
    /// Creates an empty table.
    ///
    /// With `strict` set, registering a pattern twice fails with [`RouteError::DuplicateRoute`]. Otherwise
    /// the duplicate is ignored and the original registration kept.
    pub fn new(strict: bool) -> Self {
        RouteTable {
            routes: Vec::new(),
            strict,
        }
    }

    /// Returns `true` if duplicate registrations are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Changes the duplicate registration policy for subsequent registrations.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Registers `handler` under `pattern`.
    ///
    /// Returns `Ok(true)` if the route was added, or `Ok(false)` if an identical pattern already exists and
    /// the table is relaxed.
    pub fn register(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        defaults: Parameters,
    ) -> Result<bool, RouteError> {
        self.insert(Route::new(pattern, handler, defaults)?)
    }

    /// Adds an already built route, applying the same duplicate policy as [`RouteTable::register`].
    pub fn insert(&mut self, route: Route) -> Result<bool, RouteError> {
        if self.contains_pattern(route.pattern()) {
            if self.strict {
                return Err(RouteError::DuplicateRoute {
                    pattern: route.pattern().to_string(),
                });
            }
            warn!(pattern = route.pattern(), "ignoring duplicate route");
            return Ok(false);
        }

        debug!(pattern = route.pattern(), handler = %route.handler().id(), "registered route");
        self.routes.push(route);
        Ok(true)
    }

    /// Resolves a url to the first route that fully matches it.
    pub fn resolve(&self, url: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route
                .matches(url)
                .map(|parameters| RouteMatch::new(route, parameters))
        })
    }

    /// Resolves a url, failing with [`NavigationError::RouteNotFound`] when nothing matches.
    pub fn resolve_or_err(&self, url: &str) -> Result<RouteMatch<'_>, NavigationError> {
        self.resolve(url)
            .ok_or_else(|| NavigationError::RouteNotFound {
                url: url.to_string(),
            })
    }

    /// Gets the route registered with exactly this pattern.
    pub fn get(&self, pattern: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.pattern() == pattern)
    }

    /// Returns `true` if a route is registered with exactly this pattern.
    pub fn contains_pattern(&self, pattern: &str) -> bool {
        self.get(pattern).is_some()
    }

    /// Removes the route registered with exactly this pattern.
    pub fn remove(&mut self, pattern: &str) -> Option<Route> {
        let idx = self
            .routes
            .iter()
            .position(|route| route.pattern() == pattern)?;
        Some(self.routes.remove(idx))
    }

    /// Iterates over the routes in resolution order.
    pub fn iter(&self) -> slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// The number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Removes every route.
    pub fn clear(&mut self) {
        self.routes.clear()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        RouteTable::new(true)
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes.iter().map(Route::pattern).collect::<Vec<_>>())
            .field("strict", &self.strict)
            .finish()
    }
}
