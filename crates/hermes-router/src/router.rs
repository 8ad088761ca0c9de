//! Route table combining literal and pattern routes.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::route::{RouteError, RoutePath, RoutePattern};
use crate::{RouteId, RouteMatch};

#[derive(Debug, Clone)]
struct PatternRoute {
    pattern: RoutePattern,
    methods: MethodRouter,
}

/// Route table for one driver.
///
/// Literal routes live in a radix tree; pattern routes are tested in
/// registration order. When both kinds match a request, the route that was
/// registered first wins.
///
/// # Example
///
/// ```rust
/// use hermes_router::{RouteId, RoutePath, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router
///     .insert(&RoutePath::literal("/questions/:id"), Some(&Method::GET), RouteId(0))
///     .unwrap();
///
/// let found = router.match_route(&Method::GET, "/questions/1").unwrap();
/// assert_eq!(found.route, RouteId(0));
/// assert_eq!(found.params.get("id"), Some("1"));
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    patterns: Vec<PatternRoute>,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            patterns: Vec::new(),
            route_count: 0,
        }
    }

    /// Registers `route` on `path` for `method` (every method when `None`).
    pub fn insert(
        &mut self,
        path: &RoutePath,
        method: Option<&Method>,
        route: RouteId,
    ) -> Result<(), RouteError> {
        let methods = MethodRouter::new().method(method, route);
        match path {
            RoutePath::Literal(literal) => self.root.insert(literal, methods)?,
            RoutePath::Pattern(pattern) => {
                match self.patterns.iter_mut().find(|p| p.pattern == *pattern) {
                    Some(existing) => existing.methods.merge(methods),
                    None => self.patterns.push(PatternRoute {
                        pattern: pattern.clone(),
                        methods,
                    }),
                }
            }
        }
        self.route_count += 1;
        Ok(())
    }

    /// Finds the route answering `method` on `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let literal = self
            .root
            .match_path(method, path)
            .map(|(route, params)| RouteMatch::new(route, params));

        let pattern = self
            .patterns
            .iter()
            .filter_map(|p| {
                let route = p.methods.route_for(method)?;
                let params = p.pattern.captures(path)?;
                Some(RouteMatch::new(route, params))
            })
            .min_by_key(|m| m.route);

        match (literal, pattern) {
            (Some(a), Some(b)) => Some(if a.route <= b.route { a } else { b }),
            (a, b) => a.or(b),
        }
    }

    /// Lists the methods registered for `path`; empty when nothing matches.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods = self
            .root
            .lookup(path)
            .map(MethodRouter::allowed_methods)
            .unwrap_or_default();
        for p in self.patterns.iter().filter(|p| p.pattern.is_match(path)) {
            for method in p.methods.allowed_methods() {
                if !methods.contains(&method) {
                    methods.push(method);
                }
            }
        }
        methods
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(path: &str) -> RoutePath {
        RoutePath::literal(path)
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
    }

    #[test]
    fn test_router_match_literal() {
        let mut router = Router::new();
        router
            .insert(&lit("/questions"), Some(&Method::GET), RouteId(0))
            .unwrap();
        router
            .insert(&lit("/questions/:id"), Some(&Method::GET), RouteId(1))
            .unwrap();

        let m = router.match_route(&Method::GET, "/questions/7").unwrap();
        assert_eq!(m.route, RouteId(1));
        assert_eq!(m.params.get("id"), Some("7"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_router_match_pattern() {
        let mut router = Router::new();
        let path = RoutePath::pattern(r"^\/photos\/(\d+)$", "").unwrap();
        router.insert(&path, Some(&Method::GET), RouteId(0)).unwrap();

        let m = router.match_route(&Method::GET, "/photos/12").unwrap();
        assert_eq!(m.params.get("0"), Some("12"));
        assert!(router.match_route(&Method::GET, "/photos/abc").is_none());
    }

    #[test]
    fn test_router_first_registered_wins_across_kinds() {
        let mut router = Router::new();
        let any = RoutePath::pattern(r"^\/items\/.*", "").unwrap();
        router.insert(&any, Some(&Method::GET), RouteId(0)).unwrap();
        router
            .insert(&lit("/items/:id"), Some(&Method::GET), RouteId(1))
            .unwrap();

        let m = router.match_route(&Method::GET, "/items/3").unwrap();
        assert_eq!(m.route, RouteId(0));
    }

    #[test]
    fn test_router_static_segment_beats_earlier_param() {
        let mut router = Router::new();
        router
            .insert(&lit("/questions/:id"), Some(&Method::GET), RouteId(0))
            .unwrap();
        router
            .insert(&lit("/questions/new"), Some(&Method::GET), RouteId(1))
            .unwrap();

        assert_eq!(router.match_route(&Method::GET, "/questions/new").unwrap().route, RouteId(1));
        assert_eq!(router.match_route(&Method::GET, "/questions/7").unwrap().route, RouteId(0));
    }

    #[test]
    fn test_router_head_falls_back_to_get() {
        let mut router = Router::new();
        router
            .insert(&lit("/questions/:id"), Some(&Method::GET), RouteId(0))
            .unwrap();

        let m = router.match_route(&Method::HEAD, "/questions/1").unwrap();
        assert_eq!(m.route, RouteId(0));
        assert_eq!(m.params.get("id"), Some("1"));
    }

    #[test]
    fn test_router_all_methods() {
        let mut router = Router::new();
        router.insert(&lit("/ping"), None, RouteId(0)).unwrap();

        assert!(router.match_route(&Method::PATCH, "/ping").is_some());
        assert!(router.match_route(&Method::DELETE, "/ping").is_some());
    }

    #[test]
    fn test_router_method_not_allowed() {
        let mut router = Router::new();
        router
            .insert(&lit("/answers"), Some(&Method::GET), RouteId(0))
            .unwrap();

        assert!(router.match_route(&Method::POST, "/answers").is_none());
        assert_eq!(router.allowed_methods("/answers"), vec![Method::GET, Method::HEAD]);
        assert!(router.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_router_trailing_slash() {
        let mut router = Router::new();
        router
            .insert(&lit("/users"), Some(&Method::GET), RouteId(0))
            .unwrap();
        assert!(router.match_route(&Method::GET, "/users/").is_some());
    }

    #[test]
    fn test_router_root_path() {
        let mut router = Router::new();
        router.insert(&lit("/"), Some(&Method::GET), RouteId(0)).unwrap();
        assert!(router.match_route(&Method::GET, "/").is_some());
    }
}
