//! Routes bind url patterns to handler instances.
//!
//! A [`Route`] pairs a compiled [`RoutePattern`] with the [`HandlerRef`] it dispatches to and a set of
//! default parameters. Routes bind to handler *instances*, so a handler keeps its state across every
//! navigation that resolves to it. Routes are collected into a [`RouteTable`], which resolves urls in
//! registration order.

use std::{collections::HashMap, fmt};

use crate::{error::RouteError, handler::HandlerRef};

pub mod pattern;
pub mod table;

pub use pattern::{RoutePattern, Segment};
pub use table::RouteTable;

/// Named navigation parameters.
pub type Parameters = HashMap<String, String>;

/// An immutable binding of a url pattern to a handler.
#[derive(Clone)]
pub struct Route {
    pattern: RoutePattern,
    handler: HandlerRef,
    defaults: Parameters,
}

impl Route {
    /// Parses `pattern` and binds it to `handler`.
    ///
    /// `defaults` are only ever used to fill parameters missing after a url is resolved.
    pub fn new(
        pattern: &str,
        handler: HandlerRef,
        defaults: Parameters,
    ) -> Result<Self, RouteError> {
        Ok(Route {
            pattern: RoutePattern::parse(pattern)?,
            handler,
            defaults,
        })
    }

    /// The route's pattern as registered.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The compiled pattern.
    pub fn compiled(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The handler this route dispatches to.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// The default parameters.
    pub fn defaults(&self) -> &Parameters {
        &self.defaults
    }

    /// Matches the url against this route, returning the captured path parameters.
    pub fn matches(&self, url: &str) -> Option<Parameters> {
        self.pattern.captures(url)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("handler", &self.handler)
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// The result of resolving a url: the matched route and its captured path parameters.
#[derive(Clone, Debug)]
pub struct RouteMatch<'a> {
    route: &'a Route,
    parameters: Parameters,
}

impl<'a> RouteMatch<'a> {
    pub(crate) fn new(route: &'a Route, parameters: Parameters) -> Self {
        RouteMatch { route, parameters }
    }

    /// The matched route.
    pub fn route(&self) -> &'a Route {
        self.route
    }

    /// The handler of the matched route.
    pub fn handler(&self) -> &'a HandlerRef {
        &self.route.handler
    }

    /// Parameters captured from the url.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Merges the captured and default parameters into a caller supplied set.
    ///
    /// Path parameters overwrite caller values of the same name; route defaults only fill gaps.
    pub fn merge_into(&self, params: &mut Parameters) {
        for (name, value) in &self.parameters {
            params.insert(name.clone(), value.clone());
        }
        for (name, value) in &self.route.defaults {
            params
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Consumes the match, returning `params` merged as described in [`RouteMatch::merge_into`].
    pub fn into_parameters(self, mut params: Parameters) -> Parameters {
        self.merge_into(&mut params);
        params
    }
}
