//! Per-path method table.
//!
//! [`MethodRouter`] maps HTTP methods to the [`RouteId`] registered for one
//! path. A route registered without a method (the `all` slot) answers every
//! method. When several routes could answer, the one registered first wins.
//! HEAD falls back to the GET route when none is registered for it.

use http::Method;

use crate::RouteId;

/// Maps HTTP methods to route ids for a single path.
///
/// # Example
///
/// ```rust
/// use hermes_router::{MethodRouter, RouteId};
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get(RouteId(0))
///     .post(RouteId(1));
///
/// assert_eq!(router.route_for(&Method::GET), Some(RouteId(0)));
/// assert_eq!(router.route_for(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    get: Option<RouteId>,
    post: Option<RouteId>,
    put: Option<RouteId>,
    delete: Option<RouteId>,
    patch: Option<RouteId>,
    head: Option<RouteId>,
    options: Option<RouteId>,
    all: Option<RouteId>,
}

impl MethodRouter {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET route.
    #[must_use]
    pub fn get(self, route: RouteId) -> Self {
        self.method(Some(&Method::GET), route)
    }

    /// Registers a POST route.
    #[must_use]
    pub fn post(self, route: RouteId) -> Self {
        self.method(Some(&Method::POST), route)
    }

    /// Registers a route answering every method.
    #[must_use]
    pub fn all(self, route: RouteId) -> Self {
        self.method(None, route)
    }

    /// Registers a route for `method`, or for every method when `None`.
    ///
    /// Unsupported methods such as TRACE fall back to the `all` slot.
    #[must_use]
    pub fn method(mut self, method: Option<&Method>, route: RouteId) -> Self {
        if let Some(slot) = self.slot_mut(method) {
            if slot.is_none() {
                *slot = Some(route);
            }
        }
        self
    }

    /// Returns the route answering `method`.
    #[must_use]
    pub fn route_for(&self, method: &Method) -> Option<RouteId> {
        let specific = self.slot(method);
        match (specific, self.all) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Merges another table into this one; slots already taken are kept.
    pub fn merge(&mut self, other: MethodRouter) {
        let pairs = [
            (&mut self.get, other.get),
            (&mut self.post, other.post),
            (&mut self.put, other.put),
            (&mut self.delete, other.delete),
            (&mut self.patch, other.patch),
            (&mut self.head, other.head),
            (&mut self.options, other.options),
            (&mut self.all, other.all),
        ];
        for (slot, incoming) in pairs {
            if slot.is_none() {
                *slot = incoming;
            }
        }
    }

    /// Lists the methods with a registered route.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        if self.all.is_some() {
            return vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::HEAD,
                Method::OPTIONS,
            ];
        }
        [
            (Method::GET, self.get),
            (Method::POST, self.post),
            (Method::PUT, self.put),
            (Method::DELETE, self.delete),
            (Method::PATCH, self.patch),
            (Method::HEAD, self.head.or(self.get)),
            (Method::OPTIONS, self.options),
        ]
        .into_iter()
        .filter_map(|(method, route)| route.map(|_| method))
        .collect()
    }

    fn slot(&self, method: &Method) -> Option<RouteId> {
        match *method {
            Method::GET => self.get,
            Method::POST => self.post,
            Method::PUT => self.put,
            Method::DELETE => self.delete,
            Method::PATCH => self.patch,
            Method::HEAD => self.head.or(self.get),
            Method::OPTIONS => self.options,
            _ => None,
        }
    }

    fn slot_mut(&mut self, method: Option<&Method>) -> Option<&mut Option<RouteId>> {
        let Some(method) = method else {
            return Some(&mut self.all);
        };
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            _ => Some(&mut self.all),
        }
    }
}
