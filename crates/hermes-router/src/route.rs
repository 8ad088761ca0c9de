//! Route paths.
//!
//! A route is either a literal express-style path (`/questions/:id`) or a
//! compiled pattern. Full routes are built by joining a controller route with
//! an action route, and the global route prefix with the result. Joining a
//! literal into a pattern splices the escaped literal into the pattern source
//! and recompiles it with the original flags.

use std::fmt;

use regex::Regex;

use crate::params::Params;

/// Errors raised while building routes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The pattern source did not compile.
    #[error("invalid route pattern `/{source_text}/`: {message}")]
    InvalidPattern {
        /// Pattern source text.
        source_text: String,
        /// Compiler message.
        message: String,
    },

    /// A `*` segment appeared before the end of a literal path.
    #[error("wildcard must be the last segment in `{0}`")]
    WildcardNotLast(String),
}

/// Flags understood by the pattern compiler, in canonical order.
const SUPPORTED_FLAGS: [char; 4] = ['i', 'm', 's', 'x'];

/// A compiled route pattern that remembers its source text and flags.
#[derive(Clone)]
pub struct RoutePattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl RoutePattern {
    /// Compiles a pattern from its source text and flag letters.
    ///
    /// Flag letters outside `i`, `m`, `s`, `x` (such as `g` or `u`) carry no
    /// meaning for path matching and are dropped.
    pub fn new(source: impl Into<String>, flags: &str) -> Result<Self, RouteError> {
        let source = source.into();
        let flags = normalize_flags(flags);
        let compiled = if flags.is_empty() {
            source.clone()
        } else {
            format!("(?{flags}){source}")
        };
        let regex = Regex::new(&compiled).map_err(|e| RouteError::InvalidPattern {
            source_text: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source,
            flags,
            regex,
        })
    }

    /// Returns the pattern source text (without flags).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the normalized flag letters.
    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Returns the compiled regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns true if the pattern matches anywhere in `path`.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches `path` and collects capture groups as params.
    ///
    /// Named groups are stored by name, unnamed groups by their position
    /// starting at `"0"`.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let mut params = Params::new();
        let mut position = 0usize;
        for (index, name) in self.regex.capture_names().enumerate().skip(1) {
            let value = caps.get(index).map(|m| m.as_str());
            match name {
                Some(name) => {
                    if let Some(value) = value {
                        params.push(name, value);
                    }
                }
                None => {
                    if let Some(value) = value {
                        params.push(position.to_string(), value);
                    }
                    position += 1;
                }
            }
        }
        Some(params)
    }

    fn with_source(&self, source: String) -> Result<Self, RouteError> {
        Self::new(source, &self.flags)
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for RoutePattern {}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// A route path: literal or pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    /// Express-style literal path with `:param` and `*wildcard` segments.
    Literal(String),
    /// Compiled pattern route.
    Pattern(RoutePattern),
}

impl RoutePath {
    /// Creates a literal route.
    pub fn literal(path: impl Into<String>) -> Self {
        Self::Literal(path.into())
    }

    /// Creates a pattern route from source text and flags.
    pub fn pattern(source: impl Into<String>, flags: &str) -> Result<Self, RouteError> {
        RoutePattern::new(source, flags).map(Self::Pattern)
    }

    /// Returns true for pattern routes.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }

    /// Returns true for an empty literal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Literal(path) if path.is_empty())
    }

    /// Joins a base route (controller route or global prefix) with a route.
    ///
    /// Either side may be absent or empty; the other side is returned as-is.
    pub fn join(base: Option<&RoutePath>, route: Option<&RoutePath>) -> Result<Self, RouteError> {
        let base = base.filter(|b| !b.is_empty());
        let route = route.filter(|r| !r.is_empty());

        match (base, route) {
            (None, None) => Ok(Self::Literal(String::new())),
            (Some(base), None) => Ok(base.clone()),
            (None, Some(route)) => Ok(route.clone()),
            (Some(Self::Literal(base)), Some(Self::Literal(route))) => {
                Ok(Self::Literal(format!("{base}{route}")))
            }
            (Some(Self::Literal(base)), Some(Self::Pattern(route))) => {
                let prefix = escape_literal(base);
                let source = match route.source().strip_prefix('^') {
                    Some(rest) => format!("^{prefix}{rest}"),
                    None => format!("{prefix}{}", route.source()),
                };
                route.with_source(source).map(Self::Pattern)
            }
            (Some(Self::Pattern(base)), Some(Self::Literal(route))) => {
                let source = format!("{}{}", base.source(), escape_literal(route));
                base.with_source(source).map(Self::Pattern)
            }
            (Some(Self::Pattern(base)), Some(Self::Pattern(route))) => {
                let tail = route.source().strip_prefix('^').unwrap_or(route.source());
                let flags = format!("{}{}", base.flags(), route.flags());
                RoutePattern::new(format!("{}{tail}", base.source()), &flags).map(Self::Pattern)
            }
        }
    }

    /// Returns this route with a literal prefix in front of it.
    pub fn prefixed(&self, prefix: &str) -> Result<Self, RouteError> {
        Self::join(Some(&Self::literal(prefix)), Some(self))
    }

    /// Returns true if this route scopes `path`.
    ///
    /// Used for middleware mounted under a route: a literal matches itself
    /// and anything below it, a pattern matches when it matches at the start
    /// of the path.
    #[must_use]
    pub fn matches_prefix(&self, path: &str) -> bool {
        match self {
            Self::Literal(prefix) => {
                let prefix = prefix.trim_end_matches('/');
                if prefix.is_empty() {
                    return true;
                }
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Pattern(pattern) => pattern.regex().find(path).is_some_and(|m| m.start() == 0),
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(path) => f.write_str(path),
            Self::Pattern(pattern) => pattern.fmt(f),
        }
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::literal(path)
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        Self::Literal(path)
    }
}

impl From<RoutePattern> for RoutePath {
    fn from(pattern: RoutePattern) -> Self {
        Self::Pattern(pattern)
    }
}

fn escape_literal(literal: &str) -> String {
    regex::escape(literal).replace('/', "\\/")
}

fn normalize_flags(flags: &str) -> String {
    SUPPORTED_FLAGS
        .iter()
        .filter(|flag| flags.contains(**flag))
        .collect()
}
