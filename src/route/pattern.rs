//! Parsing and matching of `/`-delimited url patterns.
//!
//! A pattern is split on `/` into segments. A segment wrapped in braces, such as `{id}`, captures a named
//! parameter; every other segment must match literally. Each pattern is compiled once into an anchored regex
//! so that a url only matches when the whole string matches, which implicitly requires the same number of
//! segments.

use std::{collections::HashSet, fmt};

use regex::Regex;

use crate::error::RouteError;

use super::Parameters;

/// Characters accepted inside a captured parameter. `/` is deliberately absent.
pub const PARAMETER_CHARACTERS: &str = r"[A-Za-z0-9_.\- &]+";

/// One `/`-delimited piece of a [`RoutePattern`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches exactly this text. May be empty.
    Literal(String),
    /// Captures the segment under this name.
    Parameter(String),
}

/// A compiled url pattern.
#[derive(Clone)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl RoutePattern {
    /// Parses and compiles a pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint::route::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("Customers/{id}").unwrap();
    /// let params = pattern.captures("Customers/42").unwrap();
    /// assert_eq!(params["id"], "42");
    /// assert!(pattern.captures("Customers/42/Orders").is_none());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: String| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut names = HashSet::new();
        let mut segments = Vec::new();
        for raw in pattern.split('/') {
            let segment = match raw.strip_prefix('{') {
                Some(rest) => {
                    let Some(name) = rest.strip_suffix('}') else {
                        return Err(invalid(format!("unterminated parameter '{raw}'")));
                    };
                    if !is_parameter_name(name) {
                        return Err(invalid(format!("'{name}' is not a valid parameter name")));
                    }
                    if !names.insert(name) {
                        return Err(invalid(format!("parameter '{name}' appears more than once")));
                    }
                    Segment::Parameter(name.to_string())
                }
                None => Segment::Literal(raw.to_string()),
            };
            segments.push(segment);
        }

        let body = segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => regex::escape(text),
                Segment::Parameter(name) => format!("(?P<{name}>{PARAMETER_CHARACTERS})"),
            })
            .collect::<Vec<_>>()
            .join("/");
        let regex = Regex::new(&format!("^{body}$")).map_err(|err| invalid(err.to_string()))?;

        Ok(RoutePattern {
            source: pattern.to_string(),
            segments,
            regex,
        })
    }

    /// The pattern as it was registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The parsed segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the captured parameters in order of appearance.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Parameter(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns `true` if the whole url matches the pattern.
    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// Matches the whole url against the pattern, returning the captured parameters.
    pub fn captures(&self, url: &str) -> Option<Parameters> {
        let captures = self.regex.captures(url)?;
        Some(
            self.parameter_names()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.to_string(), value.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn is_parameter_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RoutePattern {}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePattern")
            .field("source", &self.source)
            .field("segments", &self.segments)
            .finish()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
